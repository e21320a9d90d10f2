use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that end a harvest run before or during setup
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("invalid start URL {url}: {source}")]
    InvalidStartUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("start URL {0} has no host")]
    MissingHost(String),

    #[error("cannot reach start page {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("browser renderer unavailable at {url}: {message}")]
    RendererUnavailable { url: String, message: String },

    #[error("invalid filter pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize report: {0}")]
    Report(#[from] serde_json::Error),
}

/// Errors scoped to a single page or asset; recorded and skipped
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("browser error: {0}")]
    Browser(String),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<fantoccini::error::CmdError> for FetchError {
    fn from(error: fantoccini::error::CmdError) -> Self {
        FetchError::Browser(error.to_string())
    }
}

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Whether pages are fetched through a headless browser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Plain HTTP fetches only
    #[default]
    Off,
    /// Use the browser when a WebDriver answers, otherwise fall back to HTTP
    Auto,
    /// Use the browser or fail the run
    Required,
}

/// Configuration for one harvest run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// URL to start crawling from; its host defines the scope. Config files
    /// may leave it out and take it from the command line.
    #[serde(default)]
    pub start_url: String,

    /// Directory that receives pages, assets and the report
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Maximum number of concurrent fetches
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Delay each worker sleeps after a request, in milliseconds
    #[serde(default)]
    pub delay_ms: u64,

    /// Ceiling on the number of pages fetched
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Regex patterns for URLs to include
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// Regex patterns for URLs to exclude
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Only collect assets with these extensions (empty means all)
    #[serde(default)]
    pub include_extensions: Vec<String>,

    /// Never collect assets with these extensions
    #[serde(default)]
    pub exclude_extensions: Vec<String>,

    /// Extensions the text-pattern scan looks for in raw markup and scripts
    #[serde(default = "default_pattern_extensions")]
    pub pattern_extensions: Vec<String>,

    /// Browser rendering mode
    #[serde(default)]
    pub render: RenderMode,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// User-Agent header sent with HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Whether visited pages are written to the output directory
    #[serde(default = "default_save_pages")]
    pub save_pages: bool,

    /// File name of the JSON report inside the output directory
    #[serde(default = "default_report_file")]
    pub report_file: String,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("harvest")
}

fn default_max_concurrency() -> usize {
    5
}

fn default_max_pages() -> usize {
    50
}

fn default_request_timeout() -> u64 {
    30
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_save_pages() -> bool {
    true
}

fn default_report_file() -> String {
    "report.json".to_string()
}

/// Default extensions for the text-pattern scan
pub fn default_pattern_extensions() -> Vec<String> {
    [
        "svg", "png", "jpg", "jpeg", "gif", "webp", "ico", "bmp", "avif", "css", "js", "woff",
        "woff2", "ttf", "eot", "otf",
    ]
    .iter()
    .map(|ext| ext.to_string())
    .collect()
}

impl HarvestConfig {
    /// Create a new configuration with default values
    pub fn new(start_url: &str) -> Self {
        Self {
            start_url: start_url.to_string(),
            output_dir: default_output_dir(),
            max_concurrency: default_max_concurrency(),
            delay_ms: 0,
            max_pages: default_max_pages(),
            request_timeout_secs: default_request_timeout(),
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            include_extensions: Vec::new(),
            exclude_extensions: Vec::new(),
            pattern_extensions: default_pattern_extensions(),
            render: RenderMode::Off,
            webdriver_url: default_webdriver_url(),
            user_agent: default_user_agent(),
            save_pages: default_save_pages(),
            report_file: default_report_file(),
        }
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, Box<dyn Error>> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Path of the report file
    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(&self.report_file)
    }
}

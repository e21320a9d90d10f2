use crate::error::FetchError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

/// How pages were fetched during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMethod {
    /// Plain HTTP GET; scripts never run
    Static,
    /// Rendered in a headless browser through WebDriver
    Rendered,
}

/// A fetched page, ready for extraction
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects; relative references resolve against it
    pub final_url: Url,
    pub body: String,
    pub content_type: Option<String>,
}

/// Fetches pages for the crawl loop.
///
/// Resolved once per run; workers share it as `Arc<dyn PageFetcher>`.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    fn method(&self) -> FetchMethod;

    async fn fetch_page(&self, url: &Url) -> Result<FetchedPage, FetchError>;

    /// Release any held resources (browser sessions)
    async fn shutdown(&self) {}
}

pub mod collector;
pub mod config;
pub mod crawlers;
pub mod download;
pub mod error;
pub mod filter;
pub mod layout;
pub mod normalize;
pub mod parsers;
pub mod results;
pub mod session;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::{HarvestConfig, RenderMode};
pub use crawlers::fetcher::FetchMethod;
pub use error::{FetchError, HarvestError};
pub use results::Report;
pub use session::Session;

use crawlers::browser::BrowserFetcher;
use crawlers::fetcher::PageFetcher;
use crawlers::http::HttpFetcher;
use crawlers::web::CrawlContext;
use filter::{UrlFilter, UrlFilterConfig};
use layout::OutputLayout;
use parsers::rules::ExtractionRules;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Builder for a harvest run
pub struct Harvest {
    config: HarvestConfig,
}

impl Harvest {
    /// Create a new builder for the given start URL with default settings
    pub fn new(start_url: &str) -> Self {
        Self {
            config: HarvestConfig::new(start_url),
        }
    }

    /// Set the directory that receives pages, assets and the report
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = output_dir.into();
        self
    }

    /// Set the maximum number of concurrent fetches
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.config.max_concurrency = max_concurrency;
        self
    }

    /// Set the delay each worker sleeps after a request
    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.config.delay_ms = delay_ms;
        self
    }

    /// Set the ceiling on pages fetched
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.config.max_pages = max_pages;
        self
    }

    pub fn with_render(mut self, render: RenderMode) -> Self {
        self.config.render = render;
        self
    }

    /// Set the WebDriver URL used when rendering
    pub fn with_webdriver_url(mut self, webdriver_url: &str) -> Self {
        self.config.webdriver_url = webdriver_url.to_string();
        self
    }

    /// Replace the whole configuration, keeping the current start URL when
    /// the new one leaves it empty
    pub fn with_config(mut self, mut config: HarvestConfig) -> Self {
        if config.start_url.is_empty() {
            config.start_url = std::mem::take(&mut self.config.start_url);
        }
        self.config = config;
        self
    }

    /// Load configuration from a JSON file
    pub fn with_config_file(
        self,
        path: impl AsRef<Path>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let config = HarvestConfig::from_file(path)?;
        Ok(self.with_config(config))
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Validate the configuration and set up everything the run needs.
    ///
    /// Fails on an invalid start URL, an uncreatable output directory, or a
    /// renderer that is required but cannot be reached.
    pub async fn start(self) -> Result<Harvester, HarvestError> {
        let mut config = self.config;

        // Override the WebDriver URL with an environment variable if provided
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                config.webdriver_url = webdriver_url;
            }
        }

        let mut target =
            Url::parse(&config.start_url).map_err(|source| HarvestError::InvalidStartUrl {
                url: config.start_url.clone(),
                source,
            })?;
        target.set_fragment(None);
        let host = target
            .host_str()
            .map(|host| host.to_string())
            .ok_or_else(|| HarvestError::MissingHost(config.start_url.clone()))?;

        let filter = Arc::new(UrlFilter::new(UrlFilterConfig::from_harvest(&config, &host))?);
        let rules = Arc::new(ExtractionRules::new(&config.pattern_extensions)?);

        std::fs::create_dir_all(&config.output_dir).map_err(|source| HarvestError::Io {
            path: config.output_dir.clone(),
            source,
        })?;

        let timeout = Duration::from_secs(config.request_timeout_secs);
        let http = Arc::new(HttpFetcher::new(&config.user_agent, timeout)?);
        let pages = resolve_page_fetcher(&config, &http, timeout).await?;

        ::log::info!(
            "Harvesting {} into {} (host {})",
            target,
            config.output_dir.display(),
            host
        );

        let layout = OutputLayout::new(config.output_dir.clone());
        layout.reserve(config.report_path());

        let session = Arc::new(Session::new(target, filter));
        let context = CrawlContext {
            session,
            pages,
            assets: http,
            rules,
            layout: Arc::new(layout),
            max_concurrency: config.max_concurrency,
            max_pages: config.max_pages,
            delay: Duration::from_millis(config.delay_ms),
            save_pages: config.save_pages,
        };

        Ok(Harvester { config, context })
    }
}

/// Pick the page fetcher once for the whole run
async fn resolve_page_fetcher(
    config: &HarvestConfig,
    http: &Arc<HttpFetcher>,
    timeout: Duration,
) -> Result<Arc<dyn PageFetcher>, HarvestError> {
    let fetcher: Arc<dyn PageFetcher> = match config.render {
        RenderMode::Off => http.clone(),
        RenderMode::Required => {
            let browser = BrowserFetcher::connect(&config.webdriver_url, timeout).await?;
            ::log::info!("Rendering pages through WebDriver at {}", browser.endpoint());
            Arc::new(browser)
        }
        RenderMode::Auto => match BrowserFetcher::connect(&config.webdriver_url, timeout).await {
            Ok(browser) => {
                ::log::info!("Rendering pages through WebDriver at {}", browser.endpoint());
                Arc::new(browser)
            }
            Err(e) => {
                ::log::warn!("{}; falling back to static HTTP fetches", e);
                http.clone()
            }
        },
    };
    Ok(fetcher)
}

/// A started harvest run
pub struct Harvester {
    config: HarvestConfig,
    context: CrawlContext,
}

impl Harvester {
    /// Shared run state; stays readable if `run` is dropped midway
    pub fn session(&self) -> Arc<Session> {
        Arc::clone(&self.context.session)
    }

    pub fn fetch_method(&self) -> FetchMethod {
        self.context.pages.method()
    }

    /// Crawl pages, then download every collected asset
    pub async fn run(&self) -> Result<(), HarvestError> {
        crawlers::web::crawl(&self.context).await?;
        download::download_assets(&self.context).await;
        Ok(())
    }

    /// Build the report from the current session state
    pub fn report(&self, interrupted: bool) -> Report {
        self.context.session.report(self.fetch_method(), interrupted)
    }

    pub fn report_path(&self) -> PathBuf {
        self.config.report_path()
    }

    /// Close browser sessions, if any
    pub async fn shutdown(&self) {
        self.context.pages.shutdown().await;
    }
}

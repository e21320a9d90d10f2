use crate::crawlers::fetcher::{FetchMethod, FetchedPage, PageFetcher};
use crate::error::{FetchError, HarvestError};
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::json;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;
use url::Url;

/// Common local WebDriver endpoints tried when the configured one refuses
const FALLBACK_WEBDRIVER_URLS: &[&str] = &[
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4723", // Appium default
    "http://localhost:9222", // Chrome debug port default
    "http://127.0.0.1:4444", // Try with IP instead of localhost
];

/// Pause after `<body>` appears so late scripts can inject markup
const SETTLE_DELAY: Duration = Duration::from_millis(750);

/// Rendered fetcher backed by WebDriver sessions.
///
/// Sessions are created lazily up to the number of concurrent fetches and
/// reused between pages.
#[derive(Debug)]
pub struct BrowserFetcher {
    endpoint: String,
    timeout: Duration,
    idle: Mutex<Vec<Client>>,
}

impl BrowserFetcher {
    /// Probe the WebDriver at `webdriver_url`, then the fallbacks.
    ///
    /// The first session that opens is kept for the first fetch.
    pub async fn connect(webdriver_url: &str, timeout: Duration) -> Result<Self, HarvestError> {
        let mut candidates = vec![webdriver_url];
        candidates.extend(
            FALLBACK_WEBDRIVER_URLS
                .iter()
                .copied()
                .filter(|url| *url != webdriver_url),
        );

        let mut last_error = String::from("no endpoint tried");
        for endpoint in candidates {
            match open_session(endpoint).await {
                Ok(client) => {
                    ::log::info!("Connected to WebDriver at {}", endpoint);
                    return Ok(Self {
                        endpoint: endpoint.to_string(),
                        timeout,
                        idle: Mutex::new(vec![client]),
                    });
                }
                Err(e) => {
                    ::log::debug!("WebDriver at {} unavailable: {}", endpoint, e);
                    last_error = e.to_string();
                }
            }
        }

        ::log::error!(
            "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
        );
        Err(HarvestError::RendererUnavailable {
            url: webdriver_url.to_string(),
            message: last_error,
        })
    }

    /// Endpoint the sessions are opened against
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn checkout(&self) -> Result<Client, FetchError> {
        if let Some(client) = self.idle.lock().await.pop() {
            return Ok(client);
        }
        ::log::debug!("Opening another WebDriver session at {}", self.endpoint);
        open_session(&self.endpoint)
            .await
            .map_err(|e| FetchError::Browser(e.to_string()))
    }

    async fn render(client: &Client, url: &Url, wait: Duration) -> Result<FetchedPage, FetchError> {
        client.goto(url.as_str()).await?;
        client
            .wait()
            .at_most(wait)
            .for_element(Locator::Css("body"))
            .await?;
        tokio::time::sleep(SETTLE_DELAY).await;

        let body = client.source().await?;
        let final_url = client.current_url().await?;
        Ok(FetchedPage {
            final_url,
            body,
            content_type: None,
        })
    }
}

async fn open_session(
    endpoint: &str,
) -> Result<Client, fantoccini::error::NewSessionError> {
    let mut capabilities = serde_json::Map::new();
    capabilities.insert(
        "goog:chromeOptions".to_string(),
        json!({
            "args": ["--headless=new", "--disable-gpu", "--no-sandbox", "--disable-dev-shm-usage"]
        }),
    );
    ClientBuilder::native()
        .capabilities(capabilities)
        .connect(endpoint)
        .await
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    fn method(&self) -> FetchMethod {
        FetchMethod::Rendered
    }

    async fn fetch_page(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let client = self.checkout().await?;

        match timeout(self.timeout, Self::render(&client, url, self.timeout)).await {
            Ok(Ok(page)) => {
                self.idle.lock().await.push(client);
                Ok(page)
            }
            Ok(Err(e)) => {
                // the session may be broken; don't hand it out again
                if let Err(close) = client.close().await {
                    ::log::debug!("Failed to close WebDriver session: {}", close);
                }
                Err(e)
            }
            Err(_) => {
                if let Err(close) = client.close().await {
                    ::log::debug!("Failed to close WebDriver session: {}", close);
                }
                Err(FetchError::Timeout(self.timeout))
            }
        }
    }

    async fn shutdown(&self) {
        let clients: Vec<Client> = self.idle.lock().await.drain(..).collect();
        ::log::debug!("Closing {} WebDriver sessions", clients.len());
        for client in clients {
            if let Err(e) = client.close().await {
                ::log::warn!("Failed to close WebDriver session: {}", e);
            }
        }
    }
}

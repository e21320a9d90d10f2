use crate::crawlers::fetcher::{FetchMethod, FetchedPage, PageFetcher};
use crate::error::{FetchError, HarvestError};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use std::time::Duration;
use url::Url;

/// Body and metadata of a downloaded asset
#[derive(Debug, Clone)]
pub struct FetchedAsset {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Static fetcher: one shared reqwest client with a per-request timeout
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, HarvestError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(HarvestError::Client)?;
        Ok(Self { client, timeout })
    }

    /// GET `url` and fail on any non-success status
    async fn get(&self, url: &Url) -> Result<Response, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response)
    }

    fn classify(&self, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Http(error)
        }
    }

    /// Download an asset body
    pub async fn fetch_asset(&self, url: &Url) -> Result<FetchedAsset, FetchError> {
        let response = self.get(url).await?;
        let content_type = content_type(&response);
        let bytes = response.bytes().await.map_err(|e| self.classify(e))?;

        ::log::debug!("Fetched {} ({} bytes)", url, bytes.len());
        Ok(FetchedAsset {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

fn content_type(response: &Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    fn method(&self) -> FetchMethod {
        FetchMethod::Static
    }

    async fn fetch_page(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let response = self.get(url).await?;
        let final_url = response.url().clone();
        let content_type = content_type(&response);
        let body = response.text().await.map_err(|e| self.classify(e))?;

        if final_url != *url {
            ::log::debug!("{} redirected to {}", url, final_url);
        }
        Ok(FetchedPage {
            final_url,
            body,
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new("site-harvest-test", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_page_reports_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html; charset=utf-8")
                    .set_body_string("<html></html>"),
            )
            .mount(&server)
            .await;

        let url = Url::parse(&server.uri()).unwrap();
        let page = fetcher().fetch_page(&url).await.unwrap();
        assert_eq!(page.body, "<html></html>");
        assert_eq!(
            page.content_type.as_deref(),
            Some("text/html; charset=utf-8")
        );
    }

    #[tokio::test]
    async fn test_error_status_is_a_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.svg"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/missing.svg", server.uri())).unwrap();
        let err = fetcher().fetch_asset(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Status(404)));
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new("site-harvest-test", Duration::from_millis(200)).unwrap();
        let url = Url::parse(&format!("{}/slow.png", server.uri())).unwrap();
        let err = fetcher.fetch_asset(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout(_)));
    }
}

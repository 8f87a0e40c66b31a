use crate::crawlers::crawler::PageFetcher;
use crate::error::{Result, ScrapeError};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Fetches listing pages over plain HTTP
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher with the given user agent and per-request timeout
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .gzip(true)
            .build()?;

        Ok(Self { client })
    }

    /// Wrap an already configured client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String> {
        ::log::debug!("GET {}", url);
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| ScrapeError::fetch(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::fetch(url.as_str(), status));
        }

        let body = response.text().await?;
        ::log::trace!("Fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }
}

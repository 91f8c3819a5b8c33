//! HTTP page fetching.
//!
//! A thin reqwest wrapper behind the [`PageFetcher`] trait so parsers can be
//! exercised against canned HTML in tests. Deliberately simple: one attempt
//! per call with a fixed timeout, no retries and no rate limiting — callers
//! treat any failure as "no content" and move on.

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use tracing::debug;

use crate::infrastructure::config::FetchConfig;

/// The fetch contract the parsers depend on.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch a page body as text. Network errors, timeouts and non-2xx
    /// statuses all surface as plain errors.
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

/// Configuration for HTTP client behavior.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        let fetch = FetchConfig::default();
        Self {
            timeout_seconds: fetch.timeout_seconds,
            user_agent: fetch.user_agent,
        }
    }
}

/// Reqwest-backed [`PageFetcher`].
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    pub fn from_fetch_config(config: &FetchConfig) -> Result<Self> {
        Self::with_config(HttpClientConfig {
            timeout_seconds: config.timeout_seconds,
            user_agent: config.user_agent.clone(),
        })
    }

    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .cookie_store(true)
            .gzip(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| anyhow!("failed to create HTTP client: {e}"))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        debug!(url, "HTTP GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| anyhow!("request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("HTTP error {status} for {url}"));
        }

        let body = response
            .text()
            .await
            .map_err(|e| anyhow!("failed to read response body: {e}"))?;
        if body.is_empty() {
            return Err(anyhow!("empty response from {url}"));
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation_with_defaults() {
        assert!(HttpClient::new().is_ok());
    }

    #[test]
    fn client_creation_with_custom_config() {
        let config = HttpClientConfig {
            timeout_seconds: 3,
            user_agent: "test-agent".to_string(),
        };
        assert!(HttpClient::with_config(config).is_ok());
    }
}

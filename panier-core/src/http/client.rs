//! HTTP client trait and implementations.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::FetchError;

use super::rate_limiter::RateLimiter;
use super::FETCH_TIMEOUT_SECS;

/// Identifying client tag sent with every page fetch.
const USER_AGENT: &str = "Mozilla/5.0 (compatible; Panier/1.0; +https://panier.app)";

/// Trait for HTTP clients, enabling mockability in tests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Fetch text content from a URL.
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

/// Production HTTP client with a fixed timeout and per-host politeness delay.
pub struct ReqwestClient {
    inner: reqwest::Client,
    rate_limiter: RateLimiter,
}

impl ReqwestClient {
    /// Create a client with the default 8s timeout and 200ms per-host delay.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_rate_limit(Duration::from_millis(200))
    }

    /// Create a client with a custom per-host delay. Zero disables it.
    pub fn with_rate_limit(min_delay: Duration) -> Result<Self, reqwest::Error> {
        let inner = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            inner,
            rate_limiter: RateLimiter::new(min_delay),
        })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let parsed = reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        if let Some(host) = parsed.host_str() {
            self.rate_limiter.wait(host).await;
        }

        tracing::debug!(url, "fetching");
        let response = self.inner.get(parsed).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(FETCH_TIMEOUT_SECS)
            } else {
                FetchError::RequestFailed(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url, status = %status, "fetch returned non-success status");
            return Err(FetchError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(FETCH_TIMEOUT_SECS)
            } else {
                FetchError::RequestFailed(e)
            }
        })?;

        String::from_utf8(bytes.to_vec())
            .map_err(|e| FetchError::InvalidEncoding(format!("Invalid UTF-8 in response: {}", e)))
    }
}

/// Mock response for testing.
#[derive(Clone)]
pub enum MockResponse {
    Text(String),
    Status(u16),
    Timeout,
    Error(String),
}

/// Mock HTTP client for testing.
#[derive(Default)]
pub struct MockClient {
    responses: HashMap<String, MockResponse>,
}

impl MockClient {
    /// Create a new empty mock client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a response for a URL.
    pub fn with_response(mut self, url: &str, response: MockResponse) -> Self {
        self.responses.insert(url.to_string(), response);
        self
    }

    /// Add a text response for a URL.
    pub fn with_text(self, url: &str, text: &str) -> Self {
        self.with_response(url, MockResponse::Text(text.to_string()))
    }

    /// Add an HTTP status response for a URL.
    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.with_response(url, MockResponse::Status(status))
    }

    /// Make a URL time out.
    pub fn with_timeout(self, url: &str) -> Self {
        self.with_response(url, MockResponse::Timeout)
    }
}

#[async_trait]
impl HttpClient for MockClient {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        match self.responses.get(url) {
            Some(MockResponse::Text(text)) => Ok(text.clone()),
            Some(MockResponse::Status(status)) => Err(FetchError::Status(*status)),
            Some(MockResponse::Timeout) => Err(FetchError::Timeout(FETCH_TIMEOUT_SECS)),
            Some(MockResponse::Error(e)) => Err(FetchError::InvalidUrl(e.clone())),
            None => Err(FetchError::InvalidUrl(format!(
                "No mock response for URL: {}",
                url
            ))),
        }
    }
}

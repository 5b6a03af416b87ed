//! Overpass downloads with a bounded retry budget.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, REFERER, USER_AGENT};
use thiserror::Error;

use super::overpass::OverpassResponse;
use crate::config::{FetchConfig, RetryPolicy};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("rate limited (HTTP 429)")]
    RateLimited,
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("response body is not valid JSON: {0}")]
    Decode(String),
}

/// One round trip to an Overpass interpreter
#[async_trait]
pub trait OverpassTransport: Send + Sync {
    async fn execute(&self, query: &str) -> Result<serde_json::Value, FetchError>;
}

/// `GET {url}?data={query}` over reqwest
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpTransport {
    pub fn new(config: &FetchConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(&config.user_agent)?);
        headers.insert(REFERER, HeaderValue::from_str(&config.referer)?);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            url: config.overpass_url.clone(),
        })
    }
}

#[async_trait]
impl OverpassTransport for HttpTransport {
    async fn execute(&self, query: &str) -> Result<serde_json::Value, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("data", query)])
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited);
        }
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

pub struct OverpassFetcher<T> {
    transport: T,
    retry: RetryPolicy,
}

impl OverpassFetcher<HttpTransport> {
    pub fn from_config(config: &FetchConfig) -> anyhow::Result<Self> {
        Ok(Self::new(HttpTransport::new(config)?, config.retry))
    }
}

impl<T: OverpassTransport> OverpassFetcher<T> {
    pub fn new(transport: T, retry: RetryPolicy) -> Self {
        Self { transport, retry }
    }

    /// Runs `query`, retrying per the policy.
    ///
    /// Returns `None` once every attempt has failed; callers skip the
    /// current import phase in that case.
    pub async fn fetch(&self, query: &str) -> Option<OverpassResponse> {
        let max_attempts = self.retry.max_attempts.max(1);
        tracing::info!("Downloading data...");

        for attempt in 1..=max_attempts {
            let delay = match self.transport.execute(query).await {
                Ok(value) => return Some(OverpassResponse::from_value(value)),
                Err(FetchError::RateLimited) => {
                    tracing::warn!(
                        "Rate limited, waiting {:?} (attempt {}/{})",
                        self.retry.rate_limit_delay,
                        attempt,
                        max_attempts
                    );
                    self.retry.rate_limit_delay
                }
                Err(e) => {
                    tracing::warn!("Attempt {}/{} failed: {}", attempt, max_attempts, e);
                    self.retry.failure_delay
                }
            };

            if attempt < max_attempts {
                tokio::time::sleep(delay).await;
            }
        }

        tracing::error!("Giving up after {} attempts", max_attempts);
        None
    }
}

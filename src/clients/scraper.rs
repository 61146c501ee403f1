use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::UpstreamConfig;
use crate::constants::SCRAPE_PATH;
use crate::models::tender::{TenderPayload, TenderQuery};

/// Ways a scrape call can fail.
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    #[error("Backend API failed: 429 Too Many Requests")]
    RateLimited,

    #[error("Backend API failed: {status} {reason}")]
    Status { status: u16, reason: String },

    #[error("Backend API unreachable: {0}")]
    Network(String),

    #[error("Backend API did not respond within {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Backend API returned an invalid body: {0}")]
    InvalidBody(String),
}

impl UpstreamError {
    /// Metric label for this failure.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::Status { .. } => "status",
            Self::Network(_) => "network",
            Self::Timeout(_) => "timeout",
            Self::InvalidBody(_) => "invalid_body",
        }
    }

    #[must_use]
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}

/// Anything that can produce a tender payload for a query.
#[async_trait]
pub trait TenderSource: Send + Sync {
    async fn fetch(&self, query: &TenderQuery) -> Result<TenderPayload, UpstreamError>;
}

#[derive(Clone)]
pub struct ScraperClient {
    client: Client,
    endpoint: Url,
    timeout: Duration,
}

impl ScraperClient {
    pub fn new(config: &UpstreamConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.as_str())
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build scraper HTTP client: {e}"))?;

        Self::with_shared_client(client, &config.base_url, config.request_timeout())
    }

    pub fn with_shared_client(
        client: Client,
        base_url: &str,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let endpoint = format!("{}{SCRAPE_PATH}", base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&endpoint)?;

        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn map_transport_error(&self, err: &reqwest::Error) -> UpstreamError {
        if err.is_timeout() {
            UpstreamError::Timeout(self.timeout)
        } else if err.is_decode() {
            UpstreamError::InvalidBody(err.to_string())
        } else {
            UpstreamError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl TenderSource for ScraperClient {
    async fn fetch(&self, query: &TenderQuery) -> Result<TenderPayload, UpstreamError> {
        debug!(
            "Scraping {} with {} keywords",
            self.endpoint,
            query.keywords.len()
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(query)
            .send()
            .await
            .map_err(|e| self.map_transport_error(&e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(UpstreamError::RateLimited);
        }

        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_transport_error(&e))?;

        serde_json::from_slice(&body).map_err(|e| UpstreamError::InvalidBody(e.to_string()))
    }
}

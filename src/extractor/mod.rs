//! HTTP extraction from the Alpha Vantage daily price endpoint.

use crate::config::ApiConfig;
use crate::models::RawQuoteResponse;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

const USER_AGENT: &str = "finanzas-etl/0.1 (scheduled daily price ingest)";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to price API failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("price API returned HTTP {status}")]
    Status { status: StatusCode },
    #[error("failed to decode price API response body: {0}")]
    Decode(#[source] reqwest::Error),
}

// ── Source trait ──────────────────────────────────────────────────────────────

/// Swappable price data source abstraction.
///
/// A body that itself encodes an application-level error or rate-limit
/// notice is NOT a fetch failure here; the caller classifies it.
#[async_trait]
pub trait PriceDataSource: Send + Sync {
    async fn fetch_daily(&self, symbol: &str) -> Result<RawQuoteResponse, ExtractError>;
}

// ── Alpha Vantage client ──────────────────────────────────────────────────────

pub struct AlphaVantageClient {
    inner: reqwest::Client,
    config: ApiConfig,
}

impl AlphaVantageClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ExtractError> {
        let inner = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .build()
            .map_err(ExtractError::Client)?;

        Ok(Self {
            inner,
            config: config.clone(),
        })
    }
}

#[async_trait]
impl PriceDataSource for AlphaVantageClient {
    /// One GET per invocation, no retries. Most recent ~100 trading days.
    async fn fetch_daily(&self, symbol: &str) -> Result<RawQuoteResponse, ExtractError> {
        info!("Fetching daily series for {}", symbol);

        let resp = self
            .inner
            .get(self.config.base_url.as_str())
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol),
                ("apikey", self.config.key.as_str()),
                ("outputsize", "compact"),
            ])
            .send()
            .await
            .map_err(ExtractError::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ExtractError::Status { status });
        }

        let body = resp.json().await.map_err(ExtractError::Decode)?;
        debug!("{}: response body decoded", symbol);
        Ok(RawQuoteResponse::new(body))
    }
}

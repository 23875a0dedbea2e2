//! Pipeline orchestrator: extract → classify → transform → load.
//!
//! Strictly sequential, one symbol per run. Any stage failure short-circuits
//! the rest of the run; nothing is persisted unless extraction,
//! classification and transformation all succeed. Re-running the pipeline
//! for overlapping dates appends duplicate rows — dedup is out of scope.

use crate::config::AppConfig;
use crate::extractor::{AlphaVantageClient, ExtractError, PriceDataSource};
use crate::loader::{LoadError, Loader};
use crate::models::ApiPayload;
use crate::transformer::{transform, TransformError};
use thiserror::Error;
use tracing::info;

/// The API answered with HTTP success but the body signals a failure.
/// Distinct from [`ExtractError`]: the transport layer worked.
#[derive(Debug, Error)]
pub enum ApiLogicalError {
    #[error("API error: {0}")]
    ErrorMessage(String),
    #[error("API rate limit notice: {0}")]
    RateLimited(String),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("extraction failed: {0}")]
    Extract(#[from] ExtractError),
    #[error("API rejected the request: {0}")]
    Api(#[from] ApiLogicalError),
    #[error("transformation failed: {0}")]
    Transform(#[from] TransformError),
    #[error("load failed: {0}")]
    Load(#[from] LoadError),
}

#[derive(Debug)]
pub struct RunReport {
    pub records: usize,
    pub rows_written: u64,
}

/// Reject payloads where the API reported a logical failure inside a
/// successful HTTP response. Runs before the transformer so no error body
/// ever reaches it.
pub fn classify(payload: ApiPayload) -> Result<ApiPayload, ApiLogicalError> {
    match payload {
        ApiPayload::ErrorMessage(msg) => Err(ApiLogicalError::ErrorMessage(msg)),
        ApiPayload::RateLimit(msg) => Err(ApiLogicalError::RateLimited(msg)),
        other => Ok(other),
    }
}

pub struct Pipeline {
    config: AppConfig,
}

impl Pipeline {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub async fn run(&self, symbol: &str) -> Result<RunReport, PipelineError> {
        let source = AlphaVantageClient::new(&self.config.api)?;

        info!("=== Step 1: Extract ({}) ===", symbol);
        let raw = source.fetch_daily(symbol).await?;

        info!("=== Step 2: Transform ===");
        let payload = classify(ApiPayload::from_raw(raw))?;
        let dataset = transform(payload, symbol)?;
        info!("{}: {} records normalized", symbol, dataset.len());

        info!("=== Step 3: Load ===");
        let loader = Loader::connect(&self.config.database).await?;
        let rows_written = loader.load(&dataset, &self.config.database.table).await?;
        loader.close().await;

        Ok(RunReport {
            records: dataset.len(),
            rows_written,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawQuoteResponse;
    use serde_json::json;

    fn payload(body: serde_json::Value) -> ApiPayload {
        ApiPayload::from_raw(RawQuoteResponse::new(body))
    }

    #[test]
    fn error_message_halts_before_transform() {
        let err = classify(payload(json!({ "Error Message": "Invalid API call." }))).unwrap_err();
        assert!(matches!(err, ApiLogicalError::ErrorMessage(_)));
    }

    #[test]
    fn rate_limit_notice_halts_before_transform() {
        let err = classify(payload(json!({ "Information": "25 requests per day" }))).unwrap_err();
        assert!(matches!(err, ApiLogicalError::RateLimited(_)));
    }

    #[test]
    fn series_passes_through_classification() {
        let ok = classify(payload(json!({
            "Time Series (Daily)": { "2024-01-02": { "4. close": "185.9" } }
        })));
        assert!(matches!(ok, Ok(ApiPayload::Series(_))));
    }

    #[test]
    fn unrecognized_shape_is_left_for_the_transformer() {
        // Not a logical API error; the transformer reports MissingSeries
        // with the raw body attached.
        let ok = classify(payload(json!({ "Weekly Series": {} })));
        assert!(matches!(ok, Ok(ApiPayload::Unrecognized(_))));
    }
}

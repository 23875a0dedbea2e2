//! Reshapes a classified API payload into normalized daily price records.

use crate::models::{ApiPayload, DailyPriceRecord, NormalizedDataset};
use chrono::NaiveDate;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("daily time-series block not found in API response: {raw}")]
    MissingSeries { raw: Value },
    #[error("daily time-series block is present but contains no entries")]
    Empty,
    #[error("unparseable date key {key:?} in time-series block")]
    BadDate { key: String },
}

/// Reshape the series block into one record per date key.
///
/// Key order is preserved as received; the upstream API's ordering is not
/// verified to be chronological, so no sort is applied here. Numeric fields
/// that fail coercion become `None`; a bad date key fails the whole
/// transform. An empty series block is fatal so the loader is never invoked
/// with zero records.
pub fn transform(payload: ApiPayload, symbol: &str) -> Result<NormalizedDataset, TransformError> {
    let entries = match payload {
        ApiPayload::Series(entries) => entries,
        other => {
            return Err(TransformError::MissingSeries {
                raw: other.into_diagnostic(),
            })
        }
    };

    if entries.is_empty() {
        return Err(TransformError::Empty);
    }

    let mut records = Vec::with_capacity(entries.len());
    for (key, fields) in entries {
        let date = NaiveDate::parse_from_str(key.trim(), "%Y-%m-%d")
            .map_err(|_| TransformError::BadDate { key: key.clone() })?;

        records.push(DailyPriceRecord {
            date,
            symbol: symbol.to_string(),
            open: coerce_price(fields.open),
            high: coerce_price(fields.high),
            low: coerce_price(fields.low),
            close: coerce_price(fields.close),
            volume: coerce_volume(fields.volume),
        });
    }

    debug!("{}: {} records normalized", symbol, records.len());
    Ok(records)
}

// ── Numeric coercion ──────────────────────────────────────────────────────────

/// Coerce a raw JSON field to a price. Anything that fails to parse is a
/// missing value, never an error.
fn coerce_price(value: Option<Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                s.parse().ok()
            }
        }
        _ => None,
    }
}

/// Coerce a raw JSON field to a share count. Accepts integer strings and
/// decimal spellings like "1000.0".
fn coerce_volume(value: Option<Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(n) = s.parse::<i64>() {
                return Some(n);
            }
            s.parse::<f64>().ok().map(|f| f as i64)
        }
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

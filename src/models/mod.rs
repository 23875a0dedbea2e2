use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

// ── Daily price record ────────────────────────────────────────────────────────

/// One trading day for one symbol, after normalization.
///
/// Numeric fields are `None` when the raw value failed numeric coercion;
/// a record is never dropped for a bad field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct DailyPriceRecord {
    pub date: NaiveDate,
    pub symbol: String,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<i64>,
}

/// Ordered record sequence for a single run, single symbol.
pub type NormalizedDataset = Vec<DailyPriceRecord>;

// ── Raw API response ──────────────────────────────────────────────────────────

/// Decoded response body as returned by the price API, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct RawQuoteResponse(Value);

impl RawQuoteResponse {
    pub fn new(body: Value) -> Self {
        Self(body)
    }

    pub fn into_inner(self) -> Value {
        self.0
    }
}

/// The five labeled fields of one day in the time-series block, kept as raw
/// JSON values until the transformer coerces them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDailyEntry {
    #[serde(rename = "1. open", default)]
    pub open: Option<Value>,
    #[serde(rename = "2. high", default)]
    pub high: Option<Value>,
    #[serde(rename = "3. low", default)]
    pub low: Option<Value>,
    #[serde(rename = "4. close", default)]
    pub close: Option<Value>,
    #[serde(rename = "5. volume", default)]
    pub volume: Option<Value>,
}

// ── Payload classification ────────────────────────────────────────────────────

pub const SERIES_KEY: &str = "Time Series (Daily)";
const ERROR_KEY: &str = "Error Message";
// Alpha Vantage has used both keys for call-limit notices.
const RATE_LIMIT_KEYS: [&str; 2] = ["Information", "Note"];

/// A successful HTTP response classified into one of the shapes the API
/// actually sends. Callers pattern-match on this instead of probing the
/// body for alternative keys.
#[derive(Debug, Clone)]
pub enum ApiPayload {
    /// The daily time-series block, in the key order the API returned.
    Series(Vec<(String, RawDailyEntry)>),
    /// Application-level error inside a successful HTTP response.
    ErrorMessage(String),
    /// Call-limit notice inside a successful HTTP response.
    RateLimit(String),
    /// None of the known shapes; the raw body is kept for diagnostics.
    Unrecognized(Value),
}

impl ApiPayload {
    /// Precedence: error message, then rate-limit notice, then the series
    /// block. A body carrying both an error key and a series classifies as
    /// the error.
    pub fn from_raw(raw: RawQuoteResponse) -> Self {
        let value = raw.into_inner();
        let Value::Object(mut obj) = value else {
            return Self::Unrecognized(value);
        };

        if let Some(msg) = obj.get(ERROR_KEY).and_then(Value::as_str) {
            return Self::ErrorMessage(msg.to_string());
        }
        for key in RATE_LIMIT_KEYS {
            if let Some(msg) = obj.get(key).and_then(Value::as_str) {
                return Self::RateLimit(msg.to_string());
            }
        }

        match obj.remove(SERIES_KEY) {
            Some(Value::Object(days)) => {
                let entries = days
                    .into_iter()
                    .map(|(date, fields)| {
                        // A malformed day entry yields all-missing fields
                        // rather than discarding the whole series.
                        let entry = serde_json::from_value(fields).unwrap_or_default();
                        (date, entry)
                    })
                    .collect();
                Self::Series(entries)
            }
            Some(other) => {
                obj.insert(SERIES_KEY.to_string(), other);
                Self::Unrecognized(Value::Object(obj))
            }
            None => Self::Unrecognized(Value::Object(obj)),
        }
    }

    /// Raw JSON for error reporting. `Unrecognized` keeps the original body
    /// verbatim; the other variants are reconstructed from what was kept.
    pub fn into_diagnostic(self) -> Value {
        match self {
            Self::Series(entries) => {
                let dates: Vec<&str> = entries.iter().map(|(d, _)| d.as_str()).collect();
                json!({ SERIES_KEY: dates })
            }
            Self::ErrorMessage(msg) => json!({ ERROR_KEY: msg }),
            Self::RateLimit(msg) => json!({ RATE_LIMIT_KEYS[0]: msg }),
            Self::Unrecognized(value) => value,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn classify(body: Value) -> ApiPayload {
        ApiPayload::from_raw(RawQuoteResponse::new(body))
    }

    #[test]
    fn classifies_series() {
        let payload = classify(json!({
            "Meta Data": { "2. Symbol": "AAPL" },
            "Time Series (Daily)": {
                "2024-01-02": { "1. open": "185.6", "4. close": "185.9" }
            }
        }));
        match payload {
            ApiPayload::Series(entries) => {
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].0, "2024-01-02");
                assert_eq!(entries[0].1.open, Some(json!("185.6")));
            }
            other => panic!("expected Series, got {:?}", other),
        }
    }

    #[test]
    fn series_keys_keep_api_order() {
        let payload = classify(json!({
            "Time Series (Daily)": {
                "2024-01-05": {},
                "2024-01-02": {},
                "2024-01-09": {}
            }
        }));
        match payload {
            ApiPayload::Series(entries) => {
                let dates: Vec<&str> = entries.iter().map(|(d, _)| d.as_str()).collect();
                assert_eq!(dates, ["2024-01-05", "2024-01-02", "2024-01-09"]);
            }
            other => panic!("expected Series, got {:?}", other),
        }
    }

    #[test]
    fn classifies_error_message() {
        let payload = classify(json!({ "Error Message": "Invalid API call." }));
        match payload {
            ApiPayload::ErrorMessage(msg) => assert_eq!(msg, "Invalid API call."),
            other => panic!("expected ErrorMessage, got {:?}", other),
        }
    }

    #[test]
    fn error_message_takes_precedence_over_series() {
        let payload = classify(json!({
            "Time Series (Daily)": { "2024-01-02": { "4. close": "185.9" } },
            "Error Message": "Invalid API call."
        }));
        assert!(matches!(payload, ApiPayload::ErrorMessage(_)));
    }

    #[test]
    fn classifies_information_as_rate_limit() {
        let payload = classify(json!({ "Information": "25 requests per day" }));
        assert!(matches!(payload, ApiPayload::RateLimit(_)));
    }

    #[test]
    fn classifies_note_as_rate_limit() {
        let payload = classify(json!({ "Note": "call frequency exceeded" }));
        assert!(matches!(payload, ApiPayload::RateLimit(_)));
    }

    #[test]
    fn unknown_shape_keeps_raw_body() {
        let body = json!({ "Weekly Series": {} });
        let payload = classify(body.clone());
        match payload {
            ApiPayload::Unrecognized(raw) => assert_eq!(raw, body),
            other => panic!("expected Unrecognized, got {:?}", other),
        }
    }

    #[test]
    fn malformed_day_entry_becomes_all_missing() {
        let payload = classify(json!({
            "Time Series (Daily)": { "2024-01-02": "not an object" }
        }));
        match payload {
            ApiPayload::Series(entries) => {
                assert!(entries[0].1.open.is_none());
                assert!(entries[0].1.volume.is_none());
            }
            other => panic!("expected Series, got {:?}", other),
        }
    }
}

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::config::Interval;
use crate::errors::AppError;

const META_KEY: &str = "Meta Data";

#[derive(Debug, Default, Deserialize)]
struct SnapshotMeta {
    #[serde(rename = "2. Symbol")]
    symbol: Option<String>,

    #[serde(rename = "4. Interval")]
    interval: Option<String>,
}

/// An archived intraday response, parsed just far enough to normalize it.
///
/// Bars are kept as raw JSON values; field-level problems are the
/// normalizer's business and only drop the affected row.
#[derive(Debug, Clone, Default)]
pub struct QuoteSnapshot {
    pub symbol: Option<String>,
    pub interval: Option<String>,
    /// Timestamp key -> raw bar, in ascending key order.
    pub series: BTreeMap<String, Value>,
}

impl QuoteSnapshot {
    /// Parses an archived document, reading bars from `Time Series ({interval})`.
    ///
    /// A missing or null series yields an empty snapshot rather than an error.
    pub fn from_slice(bytes: &[u8], interval: Interval) -> Result<Self, AppError> {
        let value: Value = serde_json::from_slice(bytes)?;

        let Value::Object(mut doc) = value else {
            return Err(AppError::Snapshot(
                "expected a JSON object at the top level".to_string(),
            ));
        };

        let meta = match doc.remove(META_KEY) {
            None | Some(Value::Null) => SnapshotMeta::default(),
            Some(v) => serde_json::from_value(v)
                .map_err(|e| AppError::Snapshot(format!("invalid '{}': {}", META_KEY, e)))?,
        };

        let series_key = interval.series_key();
        let series = match doc.remove(&series_key) {
            None | Some(Value::Null) => BTreeMap::new(),
            Some(Value::Object(bars)) => bars.into_iter().collect(),
            Some(_) => {
                return Err(AppError::Snapshot(format!(
                    "'{}' must be an object keyed by timestamp",
                    series_key
                )))
            }
        };

        Ok(Self {
            symbol: meta.symbol,
            interval: meta.interval,
            series,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_meta_and_series() {
        let body = br#"{
            "Meta Data": {"1. Information": "Intraday (5min)", "2. Symbol": "TSLA", "4. Interval": "5min"},
            "Time Series (5min)": {
                "2024-01-02 09:35:00": {"1. open": "100.5"},
                "2024-01-02 09:30:00": {"1. open": "100.0"}
            }
        }"#;

        let snapshot = QuoteSnapshot::from_slice(body, Interval::FiveMinutes).unwrap();
        assert_eq!(snapshot.symbol.as_deref(), Some("TSLA"));
        assert_eq!(snapshot.interval.as_deref(), Some("5min"));

        let keys: Vec<&str> = snapshot.series.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["2024-01-02 09:30:00", "2024-01-02 09:35:00"]);
    }

    #[test]
    fn test_missing_series_is_empty() {
        let body = br#"{"Meta Data": {"2. Symbol": "TSLA", "4. Interval": "5min"}}"#;
        let snapshot = QuoteSnapshot::from_slice(body, Interval::FiveMinutes).unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_series_for_other_interval_is_ignored() {
        let body = br#"{"Time Series (15min)": {"2024-01-02 09:30:00": {}}}"#;
        let snapshot = QuoteSnapshot::from_slice(body, Interval::FiveMinutes).unwrap();
        assert!(snapshot.is_empty());
        assert!(snapshot.symbol.is_none());
    }

    #[test]
    fn test_malformed_documents_are_errors() {
        assert!(matches!(
            QuoteSnapshot::from_slice(b"not json", Interval::FiveMinutes),
            Err(AppError::Snapshot(_))
        ));
        assert!(matches!(
            QuoteSnapshot::from_slice(b"[]", Interval::FiveMinutes),
            Err(AppError::Snapshot(_))
        ));
        assert!(matches!(
            QuoteSnapshot::from_slice(br#"{"Time Series (5min)": []}"#, Interval::FiveMinutes),
            Err(AppError::Snapshot(_))
        ));
        assert!(matches!(
            QuoteSnapshot::from_slice(br#"{"Meta Data": "TSLA"}"#, Interval::FiveMinutes),
            Err(AppError::Snapshot(_))
        ));
    }
}

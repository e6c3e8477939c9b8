//! Normalization of archived snapshots into table rows.
//!
//! Every bar in the series becomes either an [`IntradayRow`] or a
//! [`RowIssue`] explaining why it was dropped. Nothing here fails the
//! whole snapshot; shape errors are caught earlier by
//! [`QuoteSnapshot::from_slice`].

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use crate::models::{IntradayRow, QuoteSnapshot, RowIssue};

const OPEN: &str = "1. open";
const HIGH: &str = "2. high";
const LOW: &str = "3. low";
const CLOSE: &str = "4. close";
const VOLUME: &str = "5. volume";

#[derive(Debug, Default)]
pub struct NormalizedBatch {
    pub rows: Vec<IntradayRow>,
    pub dropped: Vec<RowIssue>,
}

pub fn normalize(snapshot: &QuoteSnapshot) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();

    for (key, bar) in &snapshot.series {
        match normalize_bar(snapshot, key, bar) {
            Ok(row) => batch.rows.push(row),
            Err(reason) => batch.dropped.push(RowIssue::new(key.as_str(), reason)),
        }
    }

    batch
}

fn normalize_bar(snapshot: &QuoteSnapshot, key: &str, bar: &Value) -> Result<IntradayRow, String> {
    let symbol = snapshot
        .symbol
        .clone()
        .ok_or_else(|| "snapshot has no symbol".to_string())?;
    let interval = snapshot
        .interval
        .clone()
        .ok_or_else(|| "snapshot has no interval".to_string())?;

    let timestamp = parse_timestamp(key)?;

    if !bar.is_object() {
        return Err("bar is not an object".to_string());
    }

    Ok(IntradayRow {
        symbol,
        timestamp,
        open: decimal_field(bar, OPEN)?,
        high: decimal_field(bar, HIGH)?,
        low: decimal_field(bar, LOW)?,
        close: decimal_field(bar, CLOSE)?,
        volume: volume_field(bar)?,
        interval,
    })
}

/// Accepts the upstream `YYYY-MM-DD HH:MM:SS` form plus a few close cousins.
/// Timestamps without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("unparseable timestamp '{}'", raw))
}

/// Upstream sends numbers as strings; plain JSON numbers are accepted too.
fn field_text(bar: &Value, name: &str) -> Result<String, String> {
    match bar.get(name) {
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Null) | None => Err(format!("missing '{}'", name)),
        Some(other) => Err(format!("'{}' has unexpected value {}", name, other)),
    }
}

fn decimal_field(bar: &Value, name: &str) -> Result<BigDecimal, String> {
    let text = field_text(bar, name)?;
    BigDecimal::from_str(&text).map_err(|_| format!("'{}' is not numeric: '{}'", name, text))
}

fn volume_field(bar: &Value) -> Result<i32, String> {
    let text = field_text(bar, VOLUME)?;
    let volume = text
        .parse::<i64>()
        .map_err(|_| format!("'{}' is not an integer: '{}'", VOLUME, text))?;

    i32::try_from(volume).map_err(|_| format!("'{}' out of INTEGER range: {}", VOLUME, volume))
}

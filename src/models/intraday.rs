use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::Serialize;

// One normalized bar, as stored in stock_intraday.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntradayRow {
    pub symbol: String,
    pub timestamp: DateTime<Utc>, // TIMESTAMPTZ
    pub open: BigDecimal,         // NUMERIC
    pub high: BigDecimal,
    pub low: BigDecimal,
    pub close: BigDecimal,
    pub volume: i32, // INTEGER
    pub interval: String,
}

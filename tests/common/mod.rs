#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use object_store::memory::InMemory;
use serde_json::json;

use quote_archive::config::Interval;
use quote_archive::db::IntradayStore;
use quote_archive::external::quote_provider::{QuoteProvider, QuoteProviderError, RawSnapshot};
use quote_archive::models::{IntradayRow, RowIssue, UpsertReport};
use quote_archive::storage::SnapshotArchive;
use quote_archive::AppError;

/// Table keyed on timestamp alone, like the default `stock_intraday` layout.
#[derive(Default)]
pub struct FakeIntradayStore {
    rows: Mutex<BTreeMap<DateTime<Utc>, IntradayRow>>,
    ensure_calls: AtomicUsize,
    upsert_calls: AtomicUsize,
    fail_at: Option<DateTime<Utc>>,
}

impl FakeIntradayStore {
    pub fn failing_at(timestamp: DateTime<Utc>) -> Self {
        Self {
            fail_at: Some(timestamp),
            ..Self::default()
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn rows(&self) -> Vec<IntradayRow> {
        self.rows.lock().unwrap().values().cloned().collect()
    }

    pub fn ensure_calls(&self) -> usize {
        self.ensure_calls.load(Ordering::SeqCst)
    }

    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IntradayStore for FakeIntradayStore {
    async fn ensure_table(&self) -> Result<(), AppError> {
        self.ensure_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn upsert_rows(&self, rows: &[IntradayRow]) -> Result<UpsertReport, AppError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);

        let mut table = self.rows.lock().unwrap();
        let mut report = UpsertReport::default();

        for row in rows {
            if Some(row.timestamp) == self.fail_at {
                report.failed.push(RowIssue::new(
                    row.timestamp.to_rfc3339(),
                    "simulated insert failure",
                ));
                continue;
            }

            if table.contains_key(&row.timestamp) {
                report.skipped += 1;
            } else {
                table.insert(row.timestamp, row.clone());
                report.inserted += 1;
            }
        }

        Ok(report)
    }
}

/// Serves canned bodies per symbol; unknown symbols fail like a bad ticker.
#[derive(Default)]
pub struct StaticQuoteProvider {
    bodies: BTreeMap<String, Vec<u8>>,
}

impl StaticQuoteProvider {
    pub fn with(mut self, symbol: &str, body: Vec<u8>) -> Self {
        self.bodies.insert(symbol.to_string(), body);
        self
    }
}

#[async_trait]
impl QuoteProvider for StaticQuoteProvider {
    async fn fetch_intraday(
        &self,
        symbol: &str,
        _interval: Interval,
    ) -> Result<RawSnapshot, QuoteProviderError> {
        self.bodies
            .get(symbol)
            .map(|body| RawSnapshot { body: body.clone() })
            .ok_or_else(|| QuoteProviderError::BadResponse(format!("unknown symbol {}", symbol)))
    }
}

pub fn memory_archive() -> (Arc<InMemory>, SnapshotArchive) {
    let store = Arc::new(InMemory::new());
    let archive = SnapshotArchive::new(store.clone(), "memory://quotes");
    (store, archive)
}

/// A well-formed upstream document; each bar is `(timestamp, volume)`.
pub fn snapshot_body(symbol: &str, bars: &[(&str, &str)]) -> Vec<u8> {
    let mut series = serde_json::Map::new();
    for (timestamp, volume) in bars {
        series.insert(
            timestamp.to_string(),
            json!({
                "1. open": "100.0",
                "2. high": "101.0",
                "3. low": "99.5",
                "4. close": "100.5",
                "5. volume": volume
            }),
        );
    }

    serde_json::to_vec(&json!({
        "Meta Data": {
            "1. Information": "Intraday (5min) open, high, low, close prices and volume",
            "2. Symbol": symbol,
            "3. Last Refreshed": "2024-01-02 16:00:00",
            "4. Interval": "5min",
            "5. Output Size": "Compact",
            "6. Time Zone": "US/Eastern"
        },
        "Time Series (5min)": series
    }))
    .unwrap()
}

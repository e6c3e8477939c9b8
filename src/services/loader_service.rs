//! Loads the most recent archived snapshot into `stock_intraday`.
//!
//! # Processing Strategy
//!
//! 1. Walk the archive listing and keep the newest object by last-modified time
//! 2. Stop with [`LoadOutcome::NoObjects`] when the archive is empty
//! 3. Read and parse the object; stop with [`LoadOutcome::NoData`] when it
//!    has no bars
//! 4. Normalize bars into rows, recording every dropped bar
//! 5. Make sure the table exists, then insert rows that are not there yet
//!
//! The database is not touched before step 5, so an empty archive or an
//! empty snapshot never opens a connection.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::Interval;
use crate::db::IntradayStore;
use crate::errors::AppError;
use crate::models::{LoadReport, QuoteSnapshot};
use crate::services::snapshot_parser;
use crate::storage::SnapshotArchive;

#[derive(Debug, Clone)]
pub enum LoadOutcome {
    /// Nothing archived under the configured prefix.
    NoObjects,
    /// The newest object has an empty time series.
    NoData {
        object_key: String,
        last_modified: DateTime<Utc>,
    },
    Loaded(LoadReport),
}

pub struct LoaderService {
    archive: SnapshotArchive,
    store: Arc<dyn IntradayStore>,
    interval: Interval,
    prefix: Option<String>,
}

impl LoaderService {
    pub fn new(
        archive: SnapshotArchive,
        store: Arc<dyn IntradayStore>,
        interval: Interval,
        prefix: Option<String>,
    ) -> Self {
        Self {
            archive,
            store,
            interval,
            prefix,
        }
    }

    pub async fn load_latest(&self) -> Result<LoadOutcome, AppError> {
        let Some(latest) = self.archive.latest_object(self.prefix.as_deref()).await? else {
            info!(location = %self.archive.location(), "No archived snapshots found");
            return Ok(LoadOutcome::NoObjects);
        };

        let object_key = latest.location.to_string();
        info!(key = %object_key, last_modified = %latest.last_modified, "Processing file");

        let bytes = self.archive.read_object(&latest.location).await?;
        let snapshot = QuoteSnapshot::from_slice(&bytes, self.interval)?;

        if snapshot.is_empty() {
            info!(key = %object_key, "No time series data found in latest file");
            return Ok(LoadOutcome::NoData {
                object_key,
                last_modified: latest.last_modified,
            });
        }

        let batch = snapshot_parser::normalize(&snapshot);
        info!(
            key = %object_key,
            parsed = batch.rows.len(),
            dropped = batch.dropped.len(),
            "Total rows parsed"
        );
        for issue in &batch.dropped {
            warn!(key = %object_key, bar = %issue.key, "Dropped bar: {}", issue.reason);
        }

        self.store.ensure_table().await?;
        let upsert = self.store.upsert_rows(&batch.rows).await?;

        info!(
            key = %object_key,
            inserted = upsert.inserted,
            skipped = upsert.skipped,
            failed = upsert.failed.len(),
            "Insertion completed"
        );

        Ok(LoadOutcome::Loaded(LoadReport {
            object_key,
            last_modified: latest.last_modified,
            symbol: snapshot.symbol,
            rows_parsed: batch.rows.len(),
            inserted: upsert.inserted,
            skipped: upsert.skipped,
            dropped: batch.dropped,
            failed: upsert.failed,
        }))
    }
}

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::config::Interval;
use crate::errors::AppError;
use crate::external::quote_provider::QuoteProvider;
use crate::models::{ArchivedSnapshot, CollectReport};
use crate::storage::SnapshotArchive;

/// Copies the current intraday series of each configured symbol into the archive.
pub struct CollectorService {
    provider: Arc<dyn QuoteProvider>,
    archive: SnapshotArchive,
    symbols: Vec<String>,
    interval: Interval,
}

impl CollectorService {
    pub fn new(
        provider: Arc<dyn QuoteProvider>,
        archive: SnapshotArchive,
        symbols: Vec<String>,
        interval: Interval,
    ) -> Self {
        Self {
            provider,
            archive,
            symbols,
            interval,
        }
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn location(&self) -> &str {
        self.archive.location()
    }

    /// Fetches and archives every symbol in order.
    ///
    /// The first failure aborts the run. Snapshots archived before the
    /// failure stay in storage.
    pub async fn collect(&self) -> Result<CollectReport, AppError> {
        let mut archived = Vec::with_capacity(self.symbols.len());

        for symbol in &self.symbols {
            let raw = self.provider.fetch_intraday(symbol, self.interval).await?;
            let bytes = raw.body.len();

            let key = self
                .archive
                .put_snapshot(symbol, Utc::now(), raw.body)
                .await?;

            archived.push(ArchivedSnapshot {
                symbol: symbol.clone(),
                key,
                bytes,
            });
        }

        info!(
            symbols = self.symbols.len(),
            location = %self.archive.location(),
            "💾 Archived intraday snapshots"
        );

        Ok(CollectReport {
            location: self.archive.location().to_string(),
            archived,
        })
    }
}

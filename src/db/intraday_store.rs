use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Connection, PgPool};
use tracing::{error, info, warn};

use crate::config::LoaderConfig;
use crate::db::intraday_queries::{self, ConflictKey};
use crate::errors::AppError;
use crate::models::{IntradayRow, RowIssue, UpsertReport};

/// Destination of normalized rows.
#[async_trait]
pub trait IntradayStore: Send + Sync {
    /// Creates the destination table if it does not exist yet.
    async fn ensure_table(&self) -> Result<(), AppError>;

    /// Inserts every row whose key is absent.
    ///
    /// A row that fails to insert is reported in `failed` and does not
    /// stop the batch. Errors that prevent the batch as a whole (no
    /// connection, commit failure) are returned as `Err`.
    async fn upsert_rows(&self, rows: &[IntradayRow]) -> Result<UpsertReport, AppError>;
}

pub struct PgIntradayStore {
    pool: PgPool,
    key: ConflictKey,
}

impl PgIntradayStore {
    pub fn new(pool: PgPool, key: ConflictKey) -> Self {
        Self { pool, key }
    }

    /// Builds a lazily connecting pool: nothing touches the database until
    /// the first query.
    pub fn from_config(config: &LoaderConfig) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_lazy_with(config.database.connect_options()?);

        Ok(Self::new(pool, config.table_key))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl IntradayStore for PgIntradayStore {
    async fn ensure_table(&self) -> Result<(), AppError> {
        let mut conn = self.pool.acquire().await.map_err(|e| {
            error!("Failed to acquire connection for table check: {}", e);
            e
        })?;

        intraday_queries::create_table_if_missing(&mut conn, self.key).await?;
        info!(key = %self.key, "Table check/creation completed");
        Ok(())
    }

    async fn upsert_rows(&self, rows: &[IntradayRow]) -> Result<UpsertReport, AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to begin transaction: {}", e);
            e
        })?;

        let mut report = UpsertReport::default();

        for row in rows {
            // Each row gets its own savepoint so a failed insert does not
            // poison the rest of the transaction.
            let mut savepoint = Connection::begin(&mut *tx).await?;

            match intraday_queries::insert_if_absent(&mut savepoint, row, self.key).await {
                Ok(written) => {
                    savepoint.commit().await?;
                    if written {
                        report.inserted += 1;
                    } else {
                        report.skipped += 1;
                    }
                }
                Err(e) => {
                    warn!(
                        symbol = %row.symbol,
                        timestamp = %row.timestamp,
                        "Error inserting row: {}",
                        e
                    );
                    savepoint.rollback().await?;
                    report
                        .failed
                        .push(RowIssue::new(row.timestamp.to_rfc3339(), e.to_string()));
                }
            }
        }

        tx.commit().await.map_err(|e| {
            error!("Failed to commit intraday batch: {}", e);
            e
        })?;

        Ok(report)
    }
}

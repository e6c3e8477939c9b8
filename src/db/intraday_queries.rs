use std::fmt;
use std::str::FromStr;

use sqlx::PgConnection;

use crate::models::IntradayRow;

/// Primary key of `stock_intraday`.
///
/// `Timestamp` is the historical layout: one row per instant across all
/// symbols, so two symbols sharing a bar time collide and the second is
/// skipped. `SymbolTimestamp` widens the key; it only takes effect when the
/// table is created, an existing table keeps whatever key it was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictKey {
    #[default]
    Timestamp,
    SymbolTimestamp,
}

impl ConflictKey {
    fn columns(&self) -> &'static str {
        match self {
            ConflictKey::Timestamp => "timestamp",
            ConflictKey::SymbolTimestamp => "symbol, timestamp",
        }
    }
}

impl fmt::Display for ConflictKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictKey::Timestamp => f.write_str("timestamp"),
            ConflictKey::SymbolTimestamp => f.write_str("symbol_timestamp"),
        }
    }
}

impl FromStr for ConflictKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "timestamp" => Ok(ConflictKey::Timestamp),
            "symbol_timestamp" => Ok(ConflictKey::SymbolTimestamp),
            other => Err(format!(
                "unknown table key '{}', expected 'timestamp' or 'symbol_timestamp'",
                other
            )),
        }
    }
}

fn create_table_sql(key: ConflictKey) -> String {
    let (timestamp_column, table_key) = match key {
        ConflictKey::Timestamp => ("timestamp TIMESTAMPTZ PRIMARY KEY,", ""),
        ConflictKey::SymbolTimestamp => (
            "timestamp TIMESTAMPTZ NOT NULL,",
            ",\n            PRIMARY KEY (symbol, timestamp)",
        ),
    };

    format!(
        r#"
        CREATE TABLE IF NOT EXISTS stock_intraday (
            symbol TEXT NOT NULL,
            {}
            open NUMERIC,
            high NUMERIC,
            low NUMERIC,
            close NUMERIC,
            volume INTEGER,
            interval TEXT{}
        )
        "#,
        timestamp_column, table_key
    )
}

fn insert_sql(key: ConflictKey) -> String {
    format!(
        r#"
        INSERT INTO stock_intraday (symbol, timestamp, open, high, low, close, volume, interval)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT ({}) DO NOTHING
        "#,
        key.columns()
    )
}

pub async fn create_table_if_missing(
    conn: &mut PgConnection,
    key: ConflictKey,
) -> Result<(), sqlx::Error> {
    sqlx::query(&create_table_sql(key)).execute(&mut *conn).await?;
    Ok(())
}

/// Inserts `row` unless its key already exists.
///
/// Returns `true` when the row was written, `false` when it was skipped.
pub async fn insert_if_absent(
    conn: &mut PgConnection,
    row: &IntradayRow,
    key: ConflictKey,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(&insert_sql(key))
        .bind(&row.symbol)
        .bind(row.timestamp)
        .bind(&row.open)
        .bind(&row.high)
        .bind(&row.low)
        .bind(&row.close)
        .bind(row.volume)
        .bind(&row.interval)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() == 1)
}

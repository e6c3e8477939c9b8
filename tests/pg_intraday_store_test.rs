//! `PgIntradayStore` against a real Postgres.
//!
//! Ignored by default. Run with a disposable database:
//! `DATABASE_URL=postgres://... cargo test --test pg_intraday_store_test -- --ignored`
//! Every test works in its own throwaway schema and drops it afterwards.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use uuid::Uuid;

use quote_archive::db::intraday_queries::ConflictKey;
use quote_archive::db::{IntradayStore, PgIntradayStore};
use quote_archive::models::IntradayRow;

async fn scratch_schema() -> (PgPool, String) {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a disposable Postgres");
    let base = PgConnectOptions::from_str(&url).unwrap();
    let schema = format!("quote_archive_test_{}", Uuid::new_v4().simple());

    let admin = PgPool::connect_with(base.clone()).await.unwrap();
    sqlx::query(&format!("CREATE SCHEMA {}", schema))
        .execute(&admin)
        .await
        .unwrap();
    admin.close().await;

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect_with(base.options([("search_path", schema.as_str())]))
        .await
        .unwrap();

    (pool, schema)
}

async fn drop_schema(pool: PgPool, schema: &str) {
    sqlx::query(&format!("DROP SCHEMA {} CASCADE", schema))
        .execute(&pool)
        .await
        .unwrap();
    pool.close().await;
}

fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 9, minute, 0).unwrap()
}

fn row(symbol: &str, minute: u32, volume: i32) -> IntradayRow {
    IntradayRow {
        symbol: symbol.to_string(),
        timestamp: at(minute),
        open: BigDecimal::from_str("100.0").unwrap(),
        high: BigDecimal::from_str("101.0").unwrap(),
        low: BigDecimal::from_str("99.5").unwrap(),
        close: BigDecimal::from_str("100.5").unwrap(),
        volume,
        interval: "5min".to_string(),
    }
}

async fn row_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM stock_intraday")
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
#[ignore] // needs DATABASE_URL
async fn test_failed_row_rolls_back_alone_and_rerun_skips() {
    let (pool, schema) = scratch_schema().await;
    let store = PgIntradayStore::new(pool.clone(), ConflictKey::Timestamp);

    // Postgres refuses NUL in TEXT, so the middle row fails on insert.
    let rows = vec![row("TSLA", 30, 1200), row("TS\0LA", 35, 1300), row("TSLA", 40, 900)];

    store.ensure_table().await.unwrap();
    let first = store.upsert_rows(&rows).await.unwrap();

    assert_eq!(first.inserted, 2);
    assert_eq!(first.skipped, 0);
    assert_eq!(first.failed.len(), 1);
    assert_eq!(first.failed[0].key, at(35).to_rfc3339());
    assert_eq!(row_count(&pool).await, 2);

    let (symbol, close, volume) = sqlx::query_as::<_, (String, BigDecimal, i32)>(
        "SELECT symbol, close, volume FROM stock_intraday WHERE timestamp = $1",
    )
    .bind(at(40))
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(symbol, "TSLA");
    assert_eq!(close, BigDecimal::from_str("100.5").unwrap());
    assert_eq!(volume, 900);

    // Second run: table check is idempotent, existing keys are skipped.
    store.ensure_table().await.unwrap();
    let second = store.upsert_rows(&rows).await.unwrap();

    assert_eq!(second.inserted, 0);
    assert_eq!(second.skipped, 2);
    assert_eq!(second.failed.len(), 1);
    assert_eq!(row_count(&pool).await, 2);

    drop_schema(pool, &schema).await;
}

#[tokio::test]
#[ignore] // needs DATABASE_URL
async fn test_timestamp_key_skips_second_symbol_at_same_instant() {
    let (pool, schema) = scratch_schema().await;
    let store = PgIntradayStore::new(pool.clone(), ConflictKey::Timestamp);

    store.ensure_table().await.unwrap();
    store.upsert_rows(&[row("TSLA", 30, 1200)]).await.unwrap();
    let report = store.upsert_rows(&[row("AAPL", 30, 5000)]).await.unwrap();

    assert_eq!(report.inserted, 0);
    assert_eq!(report.skipped, 1);
    assert!(report.failed.is_empty());

    let symbol = sqlx::query_scalar::<_, String>("SELECT symbol FROM stock_intraday")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(symbol, "TSLA");

    drop_schema(pool, &schema).await;
}

#[tokio::test]
#[ignore] // needs DATABASE_URL
async fn test_symbol_timestamp_key_keeps_both_symbols() {
    let (pool, schema) = scratch_schema().await;
    let store = PgIntradayStore::new(pool.clone(), ConflictKey::SymbolTimestamp);

    store.ensure_table().await.unwrap();
    let report = store
        .upsert_rows(&[row("TSLA", 30, 1200), row("AAPL", 30, 5000), row("TSLA", 30, 1)])
        .await
        .unwrap();

    assert_eq!(report.inserted, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(row_count(&pool).await, 2);

    drop_schema(pool, &schema).await;
}

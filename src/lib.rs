//! Intraday quote archiving.
//!
//! Two independent jobs share an object-storage location:
//!
//! - the collector fetches intraday series from Alpha Vantage and archives
//!   each raw response as `{symbol}/{YYYY-MM-DDTHH-MM}.json`;
//! - the loader picks the newest archived snapshot, normalizes its bars and
//!   inserts the ones not yet present in the `stock_intraday` table.

pub mod app;
pub mod config;
pub mod db;
pub mod errors;
pub mod external;
pub mod jobs;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;

pub use errors::AppError;
pub use state::AppState;

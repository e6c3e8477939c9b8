pub mod intraday_queries;
pub mod intraday_store;

pub use intraday_store::{IntradayStore, PgIntradayStore};

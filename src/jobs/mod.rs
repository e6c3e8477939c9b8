//! Job entry points.
//!
//! Each job wraps one pipeline in a single catch-all and turns its outcome
//! into an [`InvocationResult`](crate::models::InvocationResult). The CLI,
//! the HTTP trigger and the cron scheduler all go through these.
//!
//! - `collect_quotes_job` - fetches intraday quotes and archives them
//! - `load_latest_job` - loads the newest archived snapshot into the database

pub mod collect_quotes_job;
pub mod load_latest_job;

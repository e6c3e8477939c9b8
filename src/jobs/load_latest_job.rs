//! Loader entry point.
//!
//! Picks the newest archived snapshot, normalizes it and inserts the rows
//! that are not in `stock_intraday` yet. Re-running on the same snapshot
//! inserts nothing new.
//!
//! # Results
//!
//! - 200 with inserted/skipped/dropped/failed counts on success
//! - 200 with a "no data" message when the newest snapshot has no bars
//! - 404 when the archive is empty
//! - 500 with the error text for anything that prevents the load

use tracing::{error, info_span, Instrument};
use uuid::Uuid;

use crate::models::InvocationResult;
use crate::services::loader_service::{LoadOutcome, LoaderService};

pub const JOB_NAME: &str = "load_latest";

pub async fn run(loader: &LoaderService) -> InvocationResult {
    let invocation_id = Uuid::new_v4();
    let span = info_span!("job", job = JOB_NAME, %invocation_id);

    async move {
        match loader.load_latest().await {
            Ok(outcome) => into_result(outcome),
            Err(e) => {
                error!("❌ Processing error: {}", e);
                InvocationResult::error(e)
            }
        }
    }
    .instrument(span)
    .await
}

fn into_result(outcome: LoadOutcome) -> InvocationResult {
    match outcome {
        LoadOutcome::NoObjects => {
            InvocationResult::not_found("No stock data files found in storage.")
        }
        LoadOutcome::NoData {
            object_key,
            last_modified,
        } => InvocationResult::ok("No time series data found in latest file.").with_details(
            &serde_json::json!({ "objectKey": object_key, "lastModified": last_modified }),
        ),
        LoadOutcome::Loaded(report) => InvocationResult::ok(format!(
            "Stock data from {} processed. Inserted: {}, Skipped: {}, Dropped: {}, Failed: {}",
            report.object_key,
            report.inserted,
            report.skipped,
            report.dropped.len(),
            report.failed.len()
        ))
        .with_details(&report),
    }
}

//! Collector entry point.
//!
//! Fetches the intraday series of every configured symbol and archives each
//! response untouched as `{symbol}/{YYYY-MM-DDTHH-MM}.json`. Any failure
//! fails the whole invocation with a 500; snapshots written before the
//! failure are not rolled back.

use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::models::InvocationResult;
use crate::services::collector_service::CollectorService;

pub const JOB_NAME: &str = "collect_quotes";

pub async fn run(collector: &CollectorService) -> InvocationResult {
    let invocation_id = Uuid::new_v4();
    let span = info_span!("job", job = JOB_NAME, %invocation_id);

    async move {
        info!(symbols = ?collector.symbols(), "📈 Collecting intraday quotes");

        match collector.collect().await {
            Ok(report) => InvocationResult::ok(format!(
                "Stock data for {:?} saved to {}.",
                collector.symbols(),
                report.location
            ))
            .with_details(&report),
            Err(e) => {
                error!("❌ Error: {}", e);
                InvocationResult::error(e)
            }
        }
    }
    .instrument(span)
    .await
}

mod intraday;
mod invocation;
mod report;
mod snapshot;

pub use intraday::IntradayRow;
pub use invocation::InvocationResult;
pub use report::{ArchivedSnapshot, CollectReport, LoadReport, RowIssue, UpsertReport};
pub use snapshot::QuoteSnapshot;

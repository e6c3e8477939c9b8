use chrono::{DateTime, Utc};
use serde::Serialize;

/// A row that did not make it into the table, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowIssue {
    pub key: String,
    pub reason: String,
}

impl RowIssue {
    pub fn new(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpsertReport {
    pub inserted: usize,
    /// Rows whose key already existed.
    pub skipped: usize,
    /// Rows whose insert raised an error and was rolled back alone.
    pub failed: Vec<RowIssue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub object_key: String,
    pub last_modified: DateTime<Utc>,
    pub symbol: Option<String>,
    pub rows_parsed: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub dropped: Vec<RowIssue>,
    pub failed: Vec<RowIssue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchivedSnapshot {
    pub symbol: String,
    pub key: String,
    pub bytes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectReport {
    pub location: String,
    pub archived: Vec<ArchivedSnapshot>,
}

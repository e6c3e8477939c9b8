use thiserror::Error;

use crate::external::quote_provider::QuoteProviderError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Rate limited by external provider")]
    RateLimited,
    #[error("External error: {0}")]
    External(String),
    #[error("Storage error: {0}")]
    Storage(#[from] object_store::Error),
    #[error("Malformed snapshot: {0}")]
    Snapshot(String),
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),
}

impl From<QuoteProviderError> for AppError {
    fn from(value: QuoteProviderError) -> Self {
        match value {
            QuoteProviderError::RateLimited => AppError::RateLimited,
            other => AppError::External(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        AppError::Snapshot(value.to_string())
    }
}

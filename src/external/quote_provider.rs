use async_trait::async_trait;
use thiserror::Error;

use crate::config::Interval;

/// Upstream intraday response, kept byte-for-byte as received.
#[derive(Debug, Clone)]
pub struct RawSnapshot {
    pub body: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum QuoteProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited")]
    RateLimited,
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch_intraday(
        &self,
        symbol: &str,
        interval: Interval,
    ) -> Result<RawSnapshot, QuoteProviderError>;
}

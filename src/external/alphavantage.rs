use crate::config::{CollectorConfig, Interval};
use crate::external::quote_provider::{QuoteProvider, QuoteProviderError, RawSnapshot};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

pub struct AlphaVantageProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AlphaVantageProvider {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &CollectorConfig) -> Self {
        Self::new(config.api_key.clone(), config.base_url.clone())
    }
}

// Alpha Vantage answers HTTP 200 for most failures and signals them in the body:
// { "Note": "Thank you for using Alpha Vantage! ... 5 calls per minute ..." }
// { "Information": "... standard API rate limit is 25 requests per day ..." }
// { "Error Message": "Invalid API call. ..." }
#[derive(Debug, Deserialize)]
struct AvStatusFields {
    #[serde(rename = "Note")]
    note: Option<String>,

    #[serde(rename = "Information")]
    information: Option<String>,

    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

/// Rejects bodies that are not a usable intraday payload.
///
/// The body itself is never rewritten; callers archive exactly the bytes
/// that passed this check.
fn check_payload(body: &[u8]) -> Result<(), QuoteProviderError> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| QuoteProviderError::Parse(e.to_string()))?;

    if !value.is_object() {
        return Err(QuoteProviderError::BadResponse(
            "expected a JSON object".into(),
        ));
    }

    let status: AvStatusFields =
        serde_json::from_value(value).map_err(|e| QuoteProviderError::Parse(e.to_string()))?;

    if let Some(msg) = status.error_message {
        return Err(QuoteProviderError::BadResponse(msg));
    }

    if status.note.is_some() || status.information.is_some() {
        return Err(QuoteProviderError::RateLimited);
    }

    Ok(())
}

#[async_trait]
impl QuoteProvider for AlphaVantageProvider {
    async fn fetch_intraday(
        &self,
        symbol: &str,
        interval: Interval,
    ) -> Result<RawSnapshot, QuoteProviderError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("function", "TIME_SERIES_INTRADAY"),
                ("symbol", symbol),
                ("interval", interval.as_str()),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| QuoteProviderError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(QuoteProviderError::BadResponse(format!(
                "HTTP {} for {}",
                status, symbol
            )));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| QuoteProviderError::Network(e.to_string()))?
            .to_vec();

        check_payload(&body)?;

        debug!(symbol, bytes = body.len(), "Fetched intraday payload");

        Ok(RawSnapshot { body })
    }
}

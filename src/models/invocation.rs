use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// What a job run reports back to whoever triggered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResult {
    pub status_code: u16,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl InvocationResult {
    pub fn ok(body: impl Into<String>) -> Self {
        Self::with_status(200, body)
    }

    pub fn not_found(body: impl Into<String>) -> Self {
        Self::with_status(404, body)
    }

    pub fn error(message: impl std::fmt::Display) -> Self {
        Self::with_status(500, format!("Error: {}", message))
    }

    fn with_status(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            body: body.into(),
            details: None,
        }
    }

    pub fn with_details<T: Serialize>(mut self, details: &T) -> Self {
        // A report that fails to serialize is left off; the body still carries the counts.
        self.details = serde_json::to_value(details).ok();
        self
    }

    pub fn is_success(&self) -> bool {
        self.status_code < 400
    }
}

impl IntoResponse for InvocationResult {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_camel_case_keys() {
        let result = InvocationResult::ok("done");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json, serde_json::json!({"statusCode": 200, "body": "done"}));
    }

    #[test]
    fn test_error_prefixes_message() {
        let result = InvocationResult::error("bucket unreachable");
        assert_eq!(result.status_code, 500);
        assert_eq!(result.body, "Error: bucket unreachable");
        assert!(!result.is_success());
    }

    #[test]
    fn test_details_are_attached() {
        let result = InvocationResult::not_found("nothing").with_details(&vec![1, 2, 3]);
        assert_eq!(result.details, Some(serde_json::json!([1, 2, 3])));
    }
}

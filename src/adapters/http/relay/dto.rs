//! HTTP DTOs for relay endpoints.
//!
//! These types decouple the HTTP API from domain types.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ErrorCode;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /message`.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageRequest {
    /// Text typed by the user.
    #[serde(default)]
    pub input: String,
    /// Session returned by an earlier response; omitted to start a new one.
    #[serde(default)]
    pub session_id: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Reply from the assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub response: String,
    pub session_id: String,
}

/// Assistant used for runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantResponse {
    pub assistant_id: String,
}

/// Liveness probe body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self { status: "ok" }
    }
}

/// Standard error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.as_str().to_string(),
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_request_session_is_optional() {
        let request: MessageRequest = serde_json::from_str(r#"{"input":"hi"}"#).unwrap();
        assert_eq!(request.input, "hi");
        assert!(request.session_id.is_none());
    }

    #[test]
    fn message_request_without_input_is_empty() {
        let request: MessageRequest = serde_json::from_str("{}").unwrap();
        assert!(request.input.is_empty());
    }

    #[test]
    fn error_response_uses_stable_code() {
        let json = serde_json::to_value(ErrorResponse::new(
            ErrorCode::NoResponse,
            "No response from the assistant.",
        ))
        .unwrap();

        assert_eq!(json["code"], "NO_RESPONSE");
        assert_eq!(json["message"], "No response from the assistant.");
    }

    #[test]
    fn health_response_serializes() {
        let json = serde_json::to_string(&HealthResponse::ok()).unwrap();
        assert_eq!(json, r#"{"status":"ok"}"#);
    }
}

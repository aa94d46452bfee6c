//! HTTP handlers for relay endpoints.
//!
//! These handlers connect Axum routes to application layer operations.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tokio_util::sync::CancellationToken;

use crate::application::{
    AssistantResolver, ProvisionError, RelayError, RelayMessageCommand, RelayMessageHandler,
};
use crate::domain::foundation::{ErrorCode, SessionId};

use super::dto::{AssistantResponse, ErrorResponse, HealthResponse, MessageRequest, MessageResponse};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state for relay handlers.
#[derive(Clone)]
pub struct RelayAppState {
    pub relay: Arc<RelayMessageHandler>,
    pub assistants: Arc<AssistantResolver>,
    /// Parent of every request's run-wait token; cancelled on shutdown.
    pub shutdown: CancellationToken,
}

impl RelayAppState {
    /// Creates a new RelayAppState.
    pub fn new(relay: Arc<RelayMessageHandler>, assistants: Arc<AssistantResolver>) -> Self {
        Self {
            relay,
            assistants,
            shutdown: CancellationToken::new(),
        }
    }

    /// Uses `token` as the server-wide shutdown signal.
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// GET|POST /assistant
// ════════════════════════════════════════════════════════════════════════════════

/// GET|POST /assistant - Get the assistant used for runs.
///
/// Provisions one on first use when no assistant is configured.
///
/// # Errors
/// - 500: Provisioning failed
pub async fn get_assistant(
    State(state): State<RelayAppState>,
) -> Result<impl IntoResponse, RelayApiError> {
    tracing::debug!("Fetching assistant");
    let assistant_id = state.assistants.resolve().await?;

    Ok((
        StatusCode::OK,
        Json(AssistantResponse {
            assistant_id: assistant_id.to_string(),
        }),
    ))
}

// ════════════════════════════════════════════════════════════════════════════════
// POST /message
// ════════════════════════════════════════════════════════════════════════════════

/// POST /message - Relay a message and return the assistant's reply.
///
/// # Errors
/// - 400: Malformed body, blank input, or malformed session id
/// - 500: No reply for the run, or any upstream failure
pub async fn send_message(
    State(state): State<RelayAppState>,
    body: Result<Json<MessageRequest>, JsonRejection>,
) -> Result<impl IntoResponse, RelayApiError> {
    let Json(request) = body.map_err(|rejection| RelayApiError::BadRequest(rejection.body_text()))?;

    let session_id = request
        .session_id
        .as_deref()
        .map(str::parse::<SessionId>)
        .transpose()
        .map_err(|_| RelayApiError::BadRequest("Invalid session ID format".to_string()))?;

    let mut cmd = RelayMessageCommand::new(request.input).with_cancel(state.shutdown.child_token());
    if let Some(session_id) = session_id {
        cmd = cmd.with_session(session_id);
    }

    let result = state.relay.handle(cmd).await?;

    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            response: result.response,
            session_id: result.session_id.to_string(),
        }),
    ))
}

// ════════════════════════════════════════════════════════════════════════════════
// GET /health
// ════════════════════════════════════════════════════════════════════════════════

/// GET /health - Liveness probe.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse::ok()))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts application errors to HTTP responses.
#[derive(Debug)]
pub enum RelayApiError {
    BadRequest(String),
    Relay(RelayError),
    Provisioning(ProvisionError),
}

impl From<RelayError> for RelayApiError {
    fn from(err: RelayError) -> Self {
        RelayApiError::Relay(err)
    }
}

impl From<ProvisionError> for RelayApiError {
    fn from(err: ProvisionError) -> Self {
        RelayApiError::Provisioning(err)
    }
}

/// Client-facing text for an error code. Upstream detail stays in the logs.
fn public_message(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::ValidationFailed => "Invalid request",
        ErrorCode::NotFound => "A required resource was not found",
        ErrorCode::RemoteServiceError => "The assistant service request failed",
        ErrorCode::Timeout => "The assistant did not respond in time",
        ErrorCode::Cancelled => "The request was cancelled",
        ErrorCode::NoResponse => "No response from the assistant.",
        ErrorCode::StorageError => "Contact storage is unavailable",
    }
}

fn internal(code: ErrorCode, detail: &dyn std::error::Error) -> (StatusCode, ErrorResponse) {
    tracing::error!(code = %code, error = %detail, "Request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorResponse::new(code, public_message(code)),
    )
}

impl IntoResponse for RelayApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            RelayApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorResponse::validation(msg)),
            RelayApiError::Relay(RelayError::Validation(err)) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::validation(err.to_string()))
            }
            RelayApiError::Relay(err) => internal(err.code(), &err),
            RelayApiError::Provisioning(err) => internal(err.code(), &err),
        };

        (status, Json(error)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{RunId, ValidationError};
    use crate::ports::AssistantApiError;
    use std::path::PathBuf;

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_maps_to_400() {
        let err = RelayApiError::from(RelayError::from(ValidationError::empty_field("input")));
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["code"], "VALIDATION_FAILED");
        assert_eq!(json["message"], "Field 'input' cannot be empty");
    }

    #[tokio::test]
    async fn no_response_maps_to_500_with_fixed_message() {
        let err = RelayApiError::from(RelayError::NoResponse {
            run_id: RunId::new("run_1").unwrap(),
        });
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["code"], "NO_RESPONSE");
        assert_eq!(json["message"], "No response from the assistant.");
    }

    #[tokio::test]
    async fn remote_detail_is_not_returned() {
        let err = RelayApiError::from(RelayError::from(AssistantApiError::unavailable(
            "upstream said sk-secret-detail",
        )));
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["code"], "REMOTE_SERVICE_ERROR");
        assert!(!json["message"].as_str().unwrap().contains("sk-secret-detail"));
    }

    #[tokio::test]
    async fn missing_provisioning_file_is_not_found() {
        let err = RelayApiError::from(ProvisionError::FileMissing(PathBuf::from(
            "files/instructions.txt",
        )));
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["code"], "NOT_FOUND");
    }
}

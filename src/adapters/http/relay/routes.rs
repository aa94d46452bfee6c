//! Axum routes for relay endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{get_assistant, health, send_message, RelayAppState};

/// Creates routes for relay endpoints.
///
/// REST Endpoints:
/// - GET|POST /assistant - Assistant used for runs
/// - POST /message - Relay a message, returns the assistant's reply
/// - GET /health - Liveness probe
pub fn relay_routes() -> Router<RelayAppState> {
    Router::new()
        .route("/assistant", get(get_assistant).post(get_assistant))
        .route("/message", post(send_message))
        .route("/health", get(health))
}

/// Relay routes bound to their state.
pub fn relay_router(state: RelayAppState) -> Router {
    relay_routes().with_state(state)
}

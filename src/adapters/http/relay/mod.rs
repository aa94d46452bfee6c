//! HTTP adapter for relay endpoints.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{AssistantResponse, ErrorResponse, MessageRequest, MessageResponse};
pub use handlers::{RelayApiError, RelayAppState};
pub use routes::{relay_router, relay_routes};

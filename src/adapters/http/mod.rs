//! HTTP adapters - REST API implementations.

pub mod relay;

pub use relay::{relay_router, RelayAppState};

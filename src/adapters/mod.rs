//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `assistant` - Hosted assistant service clients (OpenAI, mock)
//! - `http` - REST API
//! - `storage` - Contact ledger and session state

pub mod assistant;
pub mod http;
pub mod storage;

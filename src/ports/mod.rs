//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the relay and the outside world. Adapters implement these ports.
//!
//! - `AssistantApi` - Hosted assistant service (threads, runs, provisioning)
//! - `ContactStore` - Email-to-thread ledger
//! - `SessionStore` - Per-session conversation state

mod assistant_api;
mod contact_store;
mod session_store;

pub use assistant_api::{AssistantApi, AssistantApiError, CreateAssistantRequest};
pub use contact_store::{ContactStore, ContactStoreError, RecordOutcome};
pub use session_store::SessionStore;

//! Application handlers.
//!
//! Command handlers that orchestrate the relay workflow.

mod provision_assistant;
mod relay_message;

pub use provision_assistant::{AssistantResolver, ProvisionError, ProvisionSettings};
pub use relay_message::{RelayError, RelayMessageCommand, RelayMessageHandler, RelayMessageResult};

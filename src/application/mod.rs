//! Application layer - Commands and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.

pub mod handlers;
pub mod run_poller;

pub use handlers::{
    AssistantResolver, ProvisionError, ProvisionSettings, RelayError, RelayMessageCommand,
    RelayMessageHandler, RelayMessageResult,
};
pub use run_poller::{PollError, PollPolicy, RunPoller};

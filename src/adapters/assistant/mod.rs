//! Assistant Service Adapters.
//!
//! Implementations of the AssistantApi port.
//!
//! ## Available Adapters
//!
//! - `OpenAIAssistantClient` - OpenAI Assistants v2 over HTTPS
//! - `MockAssistantApi` - In-memory threads for testing

mod mock_assistant;
mod openai_assistant;

pub use mock_assistant::{MockAssistantApi, MockCall, MockOperation};
pub use openai_assistant::{OpenAIAssistantClient, OpenAIAssistantConfig};

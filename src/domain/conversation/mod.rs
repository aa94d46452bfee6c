//! Conversation module - threads, runs and replies.

mod message;
mod run;
mod state;

pub use message::{select_reply, strip_citations, MessageRole, ThreadMessage, CITATION_MARKER};
pub use run::{Run, RunStatus};
pub use state::ConversationState;

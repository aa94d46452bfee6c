//! Per-session conversation state.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AssistantId, ThreadId};

/// Which remote thread and assistant a session is talking to.
///
/// Lives in memory only; the thread association for returning users is
/// recovered through the contact ledger, not from this struct.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    pub thread_id: Option<ThreadId>,
    pub assistant_id: Option<AssistantId>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once a thread has been created or resumed.
    pub fn has_thread(&self) -> bool {
        self.thread_id.is_some()
    }

    /// Makes `thread_id` the active thread, returning the previous one.
    pub fn adopt_thread(&mut self, thread_id: ThreadId) -> Option<ThreadId> {
        self.thread_id.replace(thread_id)
    }

    /// Sets the assistant if none has been chosen yet.
    pub fn assistant_or_insert(&mut self, assistant_id: AssistantId) -> &AssistantId {
        self.assistant_id.get_or_insert(assistant_id)
    }
}

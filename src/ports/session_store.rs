//! Session Store Port - Interface for per-session conversation state.

use async_trait::async_trait;

use crate::domain::conversation::ConversationState;
use crate::domain::foundation::SessionId;

/// Port for keeping conversation state between requests of one client session
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the state for a session, or `None` if the session is unknown
    async fn load(&self, session_id: SessionId) -> Option<ConversationState>;

    /// Save the state for a session, replacing any previous value
    async fn save(&self, session_id: SessionId, state: ConversationState);
}

//! In-Memory Session Store Adapter
//!
//! Keeps each client session's conversation state in a map.
//! State is lost on restart; returning users are recovered via the contact ledger.
//!
//! The map is bounded: sessions idle longer than the configured TTL are
//! dropped, and once the capacity is reached the least recently seen session
//! is evicted to make room.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::domain::conversation::ConversationState;
use crate::domain::foundation::SessionId;
use crate::ports::SessionStore;

const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(3600);
const DEFAULT_CAPACITY: usize = 10_000;

#[derive(Debug, Clone)]
struct Entry {
    state: ConversationState,
    last_seen: Instant,
}

/// In-memory storage for session state
#[derive(Debug, Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Entry>>>,
    idle_ttl: Option<Duration>,
    capacity: usize,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self {
            sessions: Arc::default(),
            idle_ttl: Some(DEFAULT_IDLE_TTL),
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl InMemorySessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget sessions not saved for `ttl`; `None` keeps them until evicted for space
    pub fn with_idle_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.idle_ttl = ttl;
        self
    }

    /// Maximum number of sessions kept at once (at least one)
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Get the number of known sessions
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    fn is_expired(&self, entry: &Entry, now: Instant) -> bool {
        self.idle_ttl
            .is_some_and(|ttl| now.duration_since(entry.last_seen) >= ttl)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, session_id: SessionId) -> Option<ConversationState> {
        let now = Instant::now();
        self.sessions
            .read()
            .await
            .get(&session_id)
            .filter(|entry| !self.is_expired(entry, now))
            .map(|entry| entry.state.clone())
    }

    async fn save(&self, session_id: SessionId, state: ConversationState) {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        let before = sessions.len();
        sessions.retain(|_, entry| !self.is_expired(entry, now));
        let expired = before - sessions.len();
        if expired > 0 {
            tracing::debug!(expired, "Dropped idle sessions");
        }

        if !sessions.contains_key(&session_id) && sessions.len() >= self.capacity {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| *id);
            if let Some(oldest) = oldest {
                sessions.remove(&oldest);
                tracing::debug!(session_id = %oldest, "Evicted least recently seen session");
            }
        }

        sessions.insert(
            session_id,
            Entry {
                state,
                last_seen: now,
            },
        );
    }
}

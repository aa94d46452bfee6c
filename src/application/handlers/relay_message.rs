//! RelayMessageHandler - Relay one user message to the assistant and return its reply
//!
//! Each call runs against the conversation state of one client session:
//! the session's thread is created on first use, the message is posted, an
//! email in the message is recorded in the contact ledger (returning contacts
//! are moved back onto their original thread), and the assistant's reply to
//! the new run is returned without citation markers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::provision_assistant::{AssistantResolver, ProvisionError};
use crate::application::run_poller::{PollError, PollPolicy, RunPoller};
use crate::domain::contact::{extract_email, EmailAddress};
use crate::domain::conversation::{select_reply, strip_citations, ConversationState, Run, RunStatus};
use crate::domain::foundation::{AssistantId, ErrorCode, RunId, SessionId, ThreadId, ValidationError};
use crate::ports::{
    AssistantApi, AssistantApiError, ContactStore, ContactStoreError, RecordOutcome, SessionStore,
};

/// Command to relay a message
#[derive(Debug, Clone)]
pub struct RelayMessageCommand {
    /// Session to continue; a new one is started when absent
    pub session_id: Option<SessionId>,
    pub input: String,
    /// Aborts the wait for the run
    pub cancel: CancellationToken,
}

impl RelayMessageCommand {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            session_id: None,
            input: input.into(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Result of relaying a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayMessageResult {
    pub session_id: SessionId,
    /// Thread the run was made on
    pub thread_id: ThreadId,
    /// Assistant reply with citation markers removed
    pub response: String,
}

/// Error type for relaying messages
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Provisioning(#[from] ProvisionError),

    #[error("assistant service error: {0}")]
    Remote(#[from] AssistantApiError),

    #[error("contact storage error: {0}")]
    Storage(#[from] ContactStoreError),

    #[error("run {run_id} still pending after {attempts} checks")]
    Timeout { run_id: RunId, attempts: u32 },

    #[error("wait for run {run_id} was cancelled")]
    Cancelled { run_id: RunId },

    #[error("No response from the assistant.")]
    NoResponse { run_id: RunId },
}

impl RelayError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RelayError::Validation(_) => ErrorCode::ValidationFailed,
            RelayError::Provisioning(err) => err.code(),
            RelayError::Remote(AssistantApiError::NotFound(_)) => ErrorCode::NotFound,
            RelayError::Remote(AssistantApiError::Timeout { .. }) => ErrorCode::Timeout,
            RelayError::Remote(_) => ErrorCode::RemoteServiceError,
            RelayError::Storage(_) => ErrorCode::StorageError,
            RelayError::Timeout { .. } => ErrorCode::Timeout,
            RelayError::Cancelled { .. } => ErrorCode::Cancelled,
            RelayError::NoResponse { .. } => ErrorCode::NoResponse,
        }
    }
}

/// One async lock per session with a request in flight.
///
/// An entry is removed when a request finishes and no other request waits on it.
#[derive(Debug, Default)]
struct SessionLocks {
    locks: Mutex<HashMap<SessionId, Arc<AsyncMutex<()>>>>,
}

impl SessionLocks {
    fn map(&self) -> MutexGuard<'_, HashMap<SessionId, Arc<AsyncMutex<()>>>> {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn acquire(&self, session_id: SessionId) -> SessionTurn<'_> {
        let lock = self.map().entry(session_id).or_default().clone();
        SessionTurn {
            locks: self,
            session_id,
            guard: Some(lock.lock_owned().await),
        }
    }
}

/// Exclusive access to one session's state until dropped.
struct SessionTurn<'a> {
    locks: &'a SessionLocks,
    session_id: SessionId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SessionTurn<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut locks = self.locks.map();
        if locks
            .get(&self.session_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.session_id);
        }
    }
}

/// Handler for relaying messages
///
/// Requests for the same session run one at a time; a second request waits
/// for the first to save its state.
pub struct RelayMessageHandler {
    api: Arc<dyn AssistantApi>,
    contacts: Arc<dyn ContactStore>,
    sessions: Arc<dyn SessionStore>,
    session_locks: SessionLocks,
    assistants: Arc<AssistantResolver>,
    poller: RunPoller,
    resume_before_send: bool,
}

impl RelayMessageHandler {
    pub fn new(
        api: Arc<dyn AssistantApi>,
        contacts: Arc<dyn ContactStore>,
        sessions: Arc<dyn SessionStore>,
        assistants: Arc<AssistantResolver>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            poller: RunPoller::new(api.clone(), policy),
            api,
            contacts,
            sessions,
            session_locks: SessionLocks::default(),
            assistants,
            resume_before_send: false,
        }
    }

    /// Look up a returning contact's thread before posting their message
    pub fn with_resume_before_send(mut self, enabled: bool) -> Self {
        self.resume_before_send = enabled;
        self
    }

    pub async fn handle(
        &self,
        cmd: RelayMessageCommand,
    ) -> Result<RelayMessageResult, RelayError> {
        if cmd.input.trim().is_empty() {
            return Err(ValidationError::empty_field("input").into());
        }

        let session_id = cmd.session_id.unwrap_or_default();
        let span = tracing::info_span!("relay_message", session_id = %session_id);

        async move {
            let _turn = self.session_locks.acquire(session_id).await;
            let mut state = self.sessions.load(session_id).await.unwrap_or_default();

            // Saved on failure too, so a created thread stays with the session.
            let outcome = self.relay(&mut state, &cmd.input, &cmd.cancel).await;
            self.sessions.save(session_id, state).await;

            outcome.map(|(thread_id, response)| RelayMessageResult {
                session_id,
                thread_id,
                response,
            })
        }
        .instrument(span)
        .await
    }

    async fn relay(
        &self,
        state: &mut ConversationState,
        input: &str,
        cancel: &CancellationToken,
    ) -> Result<(ThreadId, String), RelayError> {
        let assistant_id = self.assistant_for(state).await?;
        let email = extract_email(input);

        if self.resume_before_send {
            if let Some(email) = &email {
                if let Some(existing) = self.contacts.find_thread(email).await? {
                    tracing::info!(email = %email, thread_id = %existing, "Resuming thread for returning contact");
                    state.adopt_thread(existing);
                }
            }
        }

        let mut thread_id = self.active_thread(state).await?;

        if self.resume_before_send {
            if let Some(email) = &email {
                thread_id = self.remember_contact(state, email, &thread_id).await?;
            }
            self.api.add_user_message(&thread_id, input).await?;
        } else {
            self.api.add_user_message(&thread_id, input).await?;
            if let Some(email) = &email {
                thread_id = self.remember_contact(state, email, &thread_id).await?;
            }
        }

        let run = self.api.create_run(&thread_id, &assistant_id).await?;
        tracing::debug!(thread_id = %thread_id, run_id = %run.id, "Run started");

        let settled = self.await_run(&thread_id, &run, cancel).await?;
        if settled.status != RunStatus::Completed {
            tracing::warn!(
                thread_id = %thread_id,
                run_id = %run.id,
                status = %settled.status,
                "Run ended without completing"
            );
        }

        let messages = self.api.list_messages(&thread_id).await?;
        let reply = select_reply(&messages, &run.id).ok_or_else(|| RelayError::NoResponse {
            run_id: run.id.clone(),
        })?;

        Ok((thread_id, strip_citations(&reply.text)))
    }

    async fn assistant_for(&self, state: &mut ConversationState) -> Result<AssistantId, RelayError> {
        if let Some(id) = &state.assistant_id {
            return Ok(id.clone());
        }
        let id = self.assistants.resolve().await?;
        Ok(state.assistant_or_insert(id).clone())
    }

    async fn active_thread(&self, state: &mut ConversationState) -> Result<ThreadId, RelayError> {
        if let Some(id) = &state.thread_id {
            return Ok(id.clone());
        }
        let id = self.api.create_thread().await?;
        tracing::info!(thread_id = %id, "Created thread");
        state.adopt_thread(id.clone());
        Ok(id)
    }

    /// Records the contact, switching to the contact's thread if already known
    async fn remember_contact(
        &self,
        state: &mut ConversationState,
        email: &EmailAddress,
        thread_id: &ThreadId,
    ) -> Result<ThreadId, RelayError> {
        match self.contacts.record(email, thread_id).await? {
            RecordOutcome::Recorded => Ok(thread_id.clone()),
            RecordOutcome::Existing(existing) => {
                if existing != *thread_id {
                    tracing::info!(
                        email = %email,
                        from = %thread_id,
                        to = %existing,
                        "Switching to returning contact's thread"
                    );
                }
                state.adopt_thread(existing.clone());
                Ok(existing)
            }
        }
    }

    async fn await_run(
        &self,
        thread_id: &ThreadId,
        run: &Run,
        cancel: &CancellationToken,
    ) -> Result<Run, RelayError> {
        match self.poller.wait(thread_id, &run.id, cancel).await {
            Ok(settled) => Ok(settled),
            Err(PollError::Api(err)) => Err(err.into()),
            Err(PollError::Timeout { attempts, elapsed }) => {
                tracing::warn!(run_id = %run.id, attempts, ?elapsed, "Run did not settle in time");
                self.abandon_run(thread_id, &run.id).await;
                Err(RelayError::Timeout {
                    run_id: run.id.clone(),
                    attempts,
                })
            }
            Err(PollError::Cancelled) => {
                tracing::info!(run_id = %run.id, "Wait for run cancelled");
                self.abandon_run(thread_id, &run.id).await;
                Err(RelayError::Cancelled {
                    run_id: run.id.clone(),
                })
            }
        }
    }

    async fn abandon_run(&self, thread_id: &ThreadId, run_id: &RunId) {
        if let Err(err) = self.api.cancel_run(thread_id, run_id).await {
            tracing::warn!(run_id = %run_id, error = %err, "Failed to cancel run");
        }
    }
}

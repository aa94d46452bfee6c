//! Assistant API Port - Interface to the hosted assistant service.
//!
//! This port abstracts the remote thread/run/assistant resources so the relay
//! can be exercised without network access.
//!
//! # Design
//!
//! - One method per remote operation; no retries at this layer
//! - Provider-agnostic error classification
//! - Messages are returned newest first
//!
//! # Example
//!
//! ```ignore
//! let thread = api.create_thread().await?;
//! api.add_user_message(&thread, "Hello").await?;
//! let run = api.create_run(&thread, &assistant).await?;
//! ```

use async_trait::async_trait;

use crate::domain::conversation::{Run, ThreadMessage};
use crate::domain::foundation::{AssistantId, FileId, RunId, ThreadId, VectorStoreId};

/// Port for the hosted assistant conversation service.
#[async_trait]
pub trait AssistantApi: Send + Sync {
    /// Create an empty conversation thread.
    async fn create_thread(&self) -> Result<ThreadId, AssistantApiError>;

    /// Append a user message to a thread.
    async fn add_user_message(
        &self,
        thread_id: &ThreadId,
        content: &str,
    ) -> Result<(), AssistantApiError>;

    /// Start the assistant on a thread.
    async fn create_run(
        &self,
        thread_id: &ThreadId,
        assistant_id: &AssistantId,
    ) -> Result<Run, AssistantApiError>;

    /// Fetch the current status of a run.
    async fn retrieve_run(
        &self,
        thread_id: &ThreadId,
        run_id: &RunId,
    ) -> Result<Run, AssistantApiError>;

    /// Ask the service to stop a run.
    async fn cancel_run(&self, thread_id: &ThreadId, run_id: &RunId)
        -> Result<Run, AssistantApiError>;

    /// List the thread's messages, newest first.
    async fn list_messages(
        &self,
        thread_id: &ThreadId,
    ) -> Result<Vec<ThreadMessage>, AssistantApiError>;

    /// Upload a document for retrieval.
    async fn upload_file(
        &self,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<FileId, AssistantApiError>;

    /// Build a searchable index over uploaded files.
    async fn create_vector_store(
        &self,
        name: &str,
        file_ids: &[FileId],
    ) -> Result<VectorStoreId, AssistantApiError>;

    /// Create an assistant with file search over the given index.
    async fn create_assistant(
        &self,
        request: CreateAssistantRequest,
    ) -> Result<AssistantId, AssistantApiError>;
}

/// Parameters for creating an assistant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAssistantRequest {
    pub name: String,
    pub model: String,
    pub instructions: String,
    pub vector_store_ids: Vec<VectorStoreId>,
}

impl CreateAssistantRequest {
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        instructions: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            instructions: instructions.into(),
            vector_store_ids: Vec::new(),
        }
    }

    /// Attaches a knowledge index.
    pub fn with_vector_store(mut self, id: VectorStoreId) -> Self {
        self.vector_store_ids.push(id);
        self
    }
}

/// Assistant service errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssistantApiError {
    /// Rate limited by the service.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The referenced thread, run, or assistant does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Service is unavailable.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// Failed to parse service response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Service rejected the request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u64,
    },
}

impl AssistantApiError {
    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Returns true if the service reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AssistantApiError::NotFound(_))
    }
}

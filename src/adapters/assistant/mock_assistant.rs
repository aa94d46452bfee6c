//! Mock Assistant API for testing.
//!
//! Provides an in-process implementation of the AssistantApi port that keeps
//! threads and messages in memory, so the relay can be exercised without
//! calling the real service.
//!
//! # Features
//!
//! - Scripted run status sequences
//! - Scripted assistant replies (or none at all)
//! - Error injection per operation
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let api = MockAssistantApi::new()
//!     .with_run_statuses([RunStatus::Queued, RunStatus::InProgress])
//!     .with_reply("Our hours are 9-5.");
//!
//! let thread = api.create_thread().await?;
//! ```

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::conversation::{MessageRole, Run, RunStatus, ThreadMessage};
use crate::domain::foundation::{AssistantId, FileId, MessageId, RunId, ThreadId, VectorStoreId};
use crate::ports::{AssistantApi, AssistantApiError, CreateAssistantRequest};

const DEFAULT_REPLY: &str = "Mock reply";

/// Operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    CreateThread,
    AddUserMessage,
    CreateRun,
    RetrieveRun,
    CancelRun,
    ListMessages,
    UploadFile,
    CreateVectorStore,
    CreateAssistant,
}

/// A recorded call against the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    CreateThread,
    AddUserMessage { thread_id: ThreadId, content: String },
    CreateRun { thread_id: ThreadId, assistant_id: AssistantId },
    RetrieveRun { thread_id: ThreadId, run_id: RunId },
    CancelRun { thread_id: ThreadId, run_id: RunId },
    ListMessages { thread_id: ThreadId },
    UploadFile { file_name: String, size: usize },
    CreateVectorStore { name: String, file_ids: Vec<FileId> },
    CreateAssistant(CreateAssistantRequest),
}

impl MockCall {
    fn operation(&self) -> MockOperation {
        match self {
            MockCall::CreateThread => MockOperation::CreateThread,
            MockCall::AddUserMessage { .. } => MockOperation::AddUserMessage,
            MockCall::CreateRun { .. } => MockOperation::CreateRun,
            MockCall::RetrieveRun { .. } => MockOperation::RetrieveRun,
            MockCall::CancelRun { .. } => MockOperation::CancelRun,
            MockCall::ListMessages { .. } => MockOperation::ListMessages,
            MockCall::UploadFile { .. } => MockOperation::UploadFile,
            MockCall::CreateVectorStore { .. } => MockOperation::CreateVectorStore,
            MockCall::CreateAssistant(_) => MockOperation::CreateAssistant,
        }
    }
}

#[derive(Debug)]
struct MockState {
    next_id: u64,
    /// Statuses returned by `retrieve_run`, consumed in order.
    statuses: VecDeque<RunStatus>,
    /// Status once `statuses` is exhausted.
    settled_status: RunStatus,
    /// Reply texts attached to new runs, consumed in order.
    replies: VecDeque<String>,
    /// Whether runs produce an assistant message at all.
    replies_enabled: bool,
    /// Thread messages, oldest first.
    threads: HashMap<ThreadId, Vec<ThreadMessage>>,
    failures: HashMap<MockOperation, AssistantApiError>,
    calls: Vec<MockCall>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            next_id: 0,
            statuses: VecDeque::new(),
            settled_status: RunStatus::Completed,
            replies: VecDeque::new(),
            replies_enabled: true,
            threads: HashMap::new(),
            failures: HashMap::new(),
            calls: Vec::new(),
        }
    }
}

impl MockState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}_{}", prefix, self.next_id)
    }

    fn thread_mut(&mut self, thread_id: &ThreadId) -> Result<&mut Vec<ThreadMessage>, AssistantApiError> {
        self.threads
            .get_mut(thread_id)
            .ok_or_else(|| AssistantApiError::not_found(format!("No thread found with id '{}'.", thread_id)))
    }
}

/// Mock assistant service for testing.
///
/// Clones share state, so a clone handed to the application can be inspected
/// from the test.
#[derive(Debug, Clone, Default)]
pub struct MockAssistantApi {
    state: Arc<Mutex<MockState>>,
    delay: Duration,
}

impl MockAssistantApi {
    /// Creates a mock whose runs complete on the first status check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues statuses for `retrieve_run` to return before settling.
    pub fn with_run_statuses(self, statuses: impl IntoIterator<Item = RunStatus>) -> Self {
        self.lock().statuses.extend(statuses);
        self
    }

    /// Sets the status returned once the queued statuses are used up.
    pub fn with_settled_status(self, status: RunStatus) -> Self {
        self.lock().settled_status = status;
        self
    }

    /// Queues the reply text for the next run.
    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.push_reply(text);
        self
    }

    /// Runs finish without writing an assistant message.
    pub fn without_replies(self) -> Self {
        self.lock().replies_enabled = false;
        self
    }

    /// Registers a thread that already exists on the service.
    pub fn with_thread(self, thread_id: ThreadId) -> Self {
        self.lock().threads.entry(thread_id).or_default();
        self
    }

    /// Makes `operation` fail with `error` until cleared.
    pub fn with_failure(self, operation: MockOperation, error: AssistantApiError) -> Self {
        self.fail(operation, error);
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queues the reply text for the next run.
    pub fn push_reply(&self, text: impl Into<String>) {
        self.lock().replies.push_back(text.into());
    }

    /// Makes `operation` fail with `error` until cleared.
    pub fn fail(&self, operation: MockOperation, error: AssistantApiError) {
        self.lock().failures.insert(operation, error);
    }

    /// Removes an injected failure.
    pub fn clear_failure(&self, operation: MockOperation) {
        self.lock().failures.remove(&operation);
    }

    /// Returns all recorded calls.
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    /// Returns how many times `operation` was called.
    pub fn call_count(&self, operation: MockOperation) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.operation() == operation)
            .count()
    }

    /// Returns the messages of a thread, oldest first.
    pub fn messages(&self, thread_id: &ThreadId) -> Vec<ThreadMessage> {
        self.lock().threads.get(thread_id).cloned().unwrap_or_default()
    }

    /// Returns the number of threads known to the mock.
    pub fn thread_count(&self) -> usize {
        self.lock().threads.len()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
    }

    /// Records the call and applies any injected failure.
    fn begin(&self, call: MockCall) -> Result<MutexGuard<'_, MockState>, AssistantApiError> {
        let mut state = self.lock();
        let operation = call.operation();
        state.calls.push(call);
        match state.failures.get(&operation) {
            Some(error) => Err(error.clone()),
            None => Ok(state),
        }
    }
}

fn mock_id<T>(result: Result<T, crate::domain::foundation::ValidationError>) -> Result<T, AssistantApiError> {
    result.map_err(|e| AssistantApiError::parse(e.to_string()))
}

#[async_trait]
impl AssistantApi for MockAssistantApi {
    async fn create_thread(&self) -> Result<ThreadId, AssistantApiError> {
        self.pause().await;
        let mut state = self.begin(MockCall::CreateThread)?;
        let thread_id = mock_id(ThreadId::new(state.next_id("thread")))?;
        state.threads.insert(thread_id.clone(), Vec::new());
        Ok(thread_id)
    }

    async fn add_user_message(
        &self,
        thread_id: &ThreadId,
        content: &str,
    ) -> Result<(), AssistantApiError> {
        self.pause().await;
        let mut state = self.begin(MockCall::AddUserMessage {
            thread_id: thread_id.clone(),
            content: content.to_string(),
        })?;
        let id = mock_id(MessageId::new(state.next_id("msg")))?;
        state.thread_mut(thread_id)?.push(ThreadMessage {
            id,
            role: MessageRole::User,
            run_id: None,
            text: content.to_string(),
        });
        Ok(())
    }

    async fn create_run(
        &self,
        thread_id: &ThreadId,
        assistant_id: &AssistantId,
    ) -> Result<Run, AssistantApiError> {
        self.pause().await;
        let mut state = self.begin(MockCall::CreateRun {
            thread_id: thread_id.clone(),
            assistant_id: assistant_id.clone(),
        })?;
        state.thread_mut(thread_id)?;

        let run_id = mock_id(RunId::new(state.next_id("run")))?;
        if state.replies_enabled {
            let text = state
                .replies
                .pop_front()
                .unwrap_or_else(|| DEFAULT_REPLY.to_string());
            let id = mock_id(MessageId::new(state.next_id("msg")))?;
            state.thread_mut(thread_id)?.push(ThreadMessage {
                id,
                role: MessageRole::Assistant,
                run_id: Some(run_id.clone()),
                text,
            });
        }
        Ok(Run::new(run_id, RunStatus::Queued))
    }

    async fn retrieve_run(
        &self,
        thread_id: &ThreadId,
        run_id: &RunId,
    ) -> Result<Run, AssistantApiError> {
        self.pause().await;
        let mut state = self.begin(MockCall::RetrieveRun {
            thread_id: thread_id.clone(),
            run_id: run_id.clone(),
        })?;
        let status = state.statuses.pop_front().unwrap_or(state.settled_status);
        Ok(Run::new(run_id.clone(), status))
    }

    async fn cancel_run(
        &self,
        thread_id: &ThreadId,
        run_id: &RunId,
    ) -> Result<Run, AssistantApiError> {
        self.pause().await;
        self.begin(MockCall::CancelRun {
            thread_id: thread_id.clone(),
            run_id: run_id.clone(),
        })?;
        Ok(Run::new(run_id.clone(), RunStatus::Cancelling))
    }

    async fn list_messages(
        &self,
        thread_id: &ThreadId,
    ) -> Result<Vec<ThreadMessage>, AssistantApiError> {
        self.pause().await;
        let mut state = self.begin(MockCall::ListMessages {
            thread_id: thread_id.clone(),
        })?;
        let mut messages = state.thread_mut(thread_id)?.clone();
        messages.reverse();
        Ok(messages)
    }

    async fn upload_file(
        &self,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<FileId, AssistantApiError> {
        self.pause().await;
        let mut state = self.begin(MockCall::UploadFile {
            file_name: file_name.to_string(),
            size: contents.len(),
        })?;
        mock_id(FileId::new(state.next_id("file")))
    }

    async fn create_vector_store(
        &self,
        name: &str,
        file_ids: &[FileId],
    ) -> Result<VectorStoreId, AssistantApiError> {
        self.pause().await;
        let mut state = self.begin(MockCall::CreateVectorStore {
            name: name.to_string(),
            file_ids: file_ids.to_vec(),
        })?;
        mock_id(VectorStoreId::new(state.next_id("vs")))
    }

    async fn create_assistant(
        &self,
        request: CreateAssistantRequest,
    ) -> Result<AssistantId, AssistantApiError> {
        self.pause().await;
        let mut state = self.begin(MockCall::CreateAssistant(request))?;
        mock_id(AssistantId::new(state.next_id("asst")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assistant() -> AssistantId {
        AssistantId::new("asst_test").unwrap()
    }

    #[tokio::test]
    async fn run_writes_reply_linked_to_run() {
        let api = MockAssistantApi::new().with_reply("Hello there");
        let thread = api.create_thread().await.unwrap();
        api.add_user_message(&thread, "hi").await.unwrap();

        let run = api.create_run(&thread, &assistant()).await.unwrap();
        let messages = api.list_messages(&thread).await.unwrap();

        assert_eq!(run.status, RunStatus::Queued);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::Assistant);
        assert_eq!(messages[0].run_id, Some(run.id));
        assert_eq!(messages[0].text, "Hello there");
        assert_eq!(messages[1].text, "hi");
    }

    #[tokio::test]
    async fn statuses_are_consumed_then_settle() {
        let api = MockAssistantApi::new()
            .with_run_statuses([RunStatus::Queued, RunStatus::InProgress]);
        let thread = api.create_thread().await.unwrap();
        let run = api.create_run(&thread, &assistant()).await.unwrap();

        let observed: Vec<RunStatus> = {
            let mut observed = Vec::new();
            for _ in 0..3 {
                observed.push(api.retrieve_run(&thread, &run.id).await.unwrap().status);
            }
            observed
        };

        assert_eq!(
            observed,
            vec![RunStatus::Queued, RunStatus::InProgress, RunStatus::Completed]
        );
        assert_eq!(api.call_count(MockOperation::RetrieveRun), 3);
    }

    #[tokio::test]
    async fn unknown_thread_is_not_found() {
        let api = MockAssistantApi::new();
        let missing = ThreadId::new("thread_missing").unwrap();

        let result = api.add_user_message(&missing, "hi").await;
        assert!(result.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn registered_thread_accepts_messages() {
        let existing = ThreadId::new("thread_existing").unwrap();
        let api = MockAssistantApi::new().with_thread(existing.clone());

        api.add_user_message(&existing, "back again").await.unwrap();
        assert_eq!(api.messages(&existing).len(), 1);
    }

    #[tokio::test]
    async fn injected_failure_is_returned_and_recorded() {
        let api = MockAssistantApi::new()
            .with_failure(MockOperation::CreateThread, AssistantApiError::AuthenticationFailed);

        let result = api.create_thread().await;
        assert_eq!(result.unwrap_err(), AssistantApiError::AuthenticationFailed);
        assert_eq!(api.calls(), vec![MockCall::CreateThread]);

        api.clear_failure(MockOperation::CreateThread);
        assert!(api.create_thread().await.is_ok());
    }

    #[tokio::test]
    async fn without_replies_leaves_only_user_messages() {
        let api = MockAssistantApi::new().without_replies();
        let thread = api.create_thread().await.unwrap();
        api.add_user_message(&thread, "hi").await.unwrap();
        api.create_run(&thread, &assistant()).await.unwrap();

        let messages = api.list_messages(&thread).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, MessageRole::User);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let api = MockAssistantApi::new();
        let clone = api.clone();
        clone.create_thread().await.unwrap();

        assert_eq!(api.thread_count(), 1);
    }
}

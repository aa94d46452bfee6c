//! OpenAI Assistants Client - Implementation of AssistantApi for OpenAI's Assistants v2 API.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAIAssistantConfig::new(api_key)
//!     .with_base_url("https://api.openai.com/v1")
//!     .with_timeout(Duration::from_secs(60));
//!
//! let client = OpenAIAssistantClient::new(config)?;
//! ```
//!
//! Every request carries the `OpenAI-Beta: assistants=v2` header. Requests are
//! made exactly once; callers decide what to do with failures.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::conversation::{MessageRole, Run, RunStatus, ThreadMessage};
use crate::domain::foundation::{AssistantId, FileId, MessageId, RunId, ThreadId, VectorStoreId};
use crate::ports::{AssistantApi, AssistantApiError, CreateAssistantRequest};

const BETA_HEADER: &str = "OpenAI-Beta";
const BETA_VALUE: &str = "assistants=v2";
const MESSAGE_PAGE_LIMIT: &str = "100";

/// Configuration for the OpenAI assistants client.
#[derive(Debug, Clone)]
pub struct OpenAIAssistantConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Base URL for the API (default: https://api.openai.com/v1).
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl OpenAIAssistantConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Creates a configuration from an already-wrapped key.
    pub fn from_secret(api_key: Secret<String>) -> Self {
        Self {
            api_key,
            ..Self::new(String::new())
        }
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Exposes the API key (for making requests).
    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// OpenAI Assistants API client.
pub struct OpenAIAssistantClient {
    config: OpenAIAssistantConfig,
    client: Client,
}

impl OpenAIAssistantClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: OpenAIAssistantConfig) -> Result<Self, AssistantApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AssistantApiError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Starts a request with authentication and the beta header applied.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.url(path))
            .bearer_auth(self.config.api_key())
            .header(BETA_HEADER, BETA_VALUE)
    }

    /// Sends a request and decodes a successful JSON body.
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, AssistantApiError> {
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                AssistantApiError::Timeout {
                    timeout_secs: self.config.timeout.as_secs(),
                }
            } else if e.is_connect() {
                AssistantApiError::network(format!("Connection failed: {}", e))
            } else {
                AssistantApiError::network(e.to_string())
            }
        })?;

        let response = Self::handle_response_status(response).await?;

        response
            .json::<T>()
            .await
            .map_err(|e| AssistantApiError::parse(format!("Failed to parse response: {}", e)))
    }

    /// Maps non-success statuses to errors.
    async fn handle_response_status(response: Response) -> Result<Response, AssistantApiError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        let message = Self::error_message(&error_body);

        match status.as_u16() {
            401 | 403 => Err(AssistantApiError::AuthenticationFailed),
            404 => Err(AssistantApiError::not_found(message)),
            429 => Err(AssistantApiError::RateLimited(message)),
            400 | 422 => Err(AssistantApiError::InvalidRequest(message)),
            500..=599 => Err(AssistantApiError::unavailable(format!(
                "Server error {}: {}",
                status, message
            ))),
            _ => Err(AssistantApiError::network(format!(
                "Unexpected status {}: {}",
                status, message
            ))),
        }
    }

    /// Extracts `error.message` from an error body, falling back to the raw body.
    fn error_message(error_body: &str) -> String {
        serde_json::from_str::<ErrorEnvelope>(error_body)
            .map(|envelope| envelope.error.message)
            .unwrap_or_else(|_| error_body.to_string())
    }
}

fn parse_id<T>(result: Result<T, crate::domain::foundation::ValidationError>) -> Result<T, AssistantApiError> {
    result.map_err(|e| AssistantApiError::parse(e.to_string()))
}

fn to_run(run: RunObject) -> Result<Run, AssistantApiError> {
    Ok(Run::new(parse_id(RunId::new(run.id))?, run.status))
}

fn to_thread_message(message: MessageObject) -> Result<ThreadMessage, AssistantApiError> {
    let text = message
        .content
        .into_iter()
        .find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.value),
            ContentBlock::Other => None,
        })
        .unwrap_or_default();

    let run_id = match message.run_id {
        Some(id) if !id.is_empty() => Some(parse_id(RunId::new(id))?),
        _ => None,
    };

    Ok(ThreadMessage {
        id: parse_id(MessageId::new(message.id))?,
        role: message.role,
        run_id,
        text,
    })
}

#[async_trait]
impl AssistantApi for OpenAIAssistantClient {
    async fn create_thread(&self) -> Result<ThreadId, AssistantApiError> {
        let thread: ObjectRef = self
            .send(self.request(Method::POST, "/threads").json(&serde_json::json!({})))
            .await?;
        tracing::debug!(thread_id = %thread.id, "Created thread");
        parse_id(ThreadId::new(thread.id))
    }

    async fn add_user_message(
        &self,
        thread_id: &ThreadId,
        content: &str,
    ) -> Result<(), AssistantApiError> {
        let body = NewMessage {
            role: MessageRole::User,
            content,
        };
        let _: ObjectRef = self
            .send(
                self.request(Method::POST, &format!("/threads/{}/messages", thread_id))
                    .json(&body),
            )
            .await?;
        Ok(())
    }

    async fn create_run(
        &self,
        thread_id: &ThreadId,
        assistant_id: &AssistantId,
    ) -> Result<Run, AssistantApiError> {
        let body = NewRun {
            assistant_id: assistant_id.as_str(),
        };
        let run: RunObject = self
            .send(
                self.request(Method::POST, &format!("/threads/{}/runs", thread_id))
                    .json(&body),
            )
            .await?;
        tracing::debug!(thread_id = %thread_id, run_id = %run.id, "Created run");
        to_run(run)
    }

    async fn retrieve_run(
        &self,
        thread_id: &ThreadId,
        run_id: &RunId,
    ) -> Result<Run, AssistantApiError> {
        let run: RunObject = self
            .send(self.request(
                Method::GET,
                &format!("/threads/{}/runs/{}", thread_id, run_id),
            ))
            .await?;
        to_run(run)
    }

    async fn cancel_run(
        &self,
        thread_id: &ThreadId,
        run_id: &RunId,
    ) -> Result<Run, AssistantApiError> {
        let run: RunObject = self
            .send(self.request(
                Method::POST,
                &format!("/threads/{}/runs/{}/cancel", thread_id, run_id),
            ))
            .await?;
        to_run(run)
    }

    async fn list_messages(
        &self,
        thread_id: &ThreadId,
    ) -> Result<Vec<ThreadMessage>, AssistantApiError> {
        let list: MessageList = self
            .send(
                self.request(Method::GET, &format!("/threads/{}/messages", thread_id))
                    .query(&[("order", "desc"), ("limit", MESSAGE_PAGE_LIMIT)]),
            )
            .await?;
        list.data.into_iter().map(to_thread_message).collect()
    }

    async fn upload_file(
        &self,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<FileId, AssistantApiError> {
        let form = Form::new()
            .text("purpose", "assistants")
            .part("file", Part::bytes(contents).file_name(file_name.to_string()));
        let file: ObjectRef = self
            .send(self.request(Method::POST, "/files").multipart(form))
            .await?;
        tracing::debug!(file_id = %file.id, file_name, "Uploaded file");
        parse_id(FileId::new(file.id))
    }

    async fn create_vector_store(
        &self,
        name: &str,
        file_ids: &[FileId],
    ) -> Result<VectorStoreId, AssistantApiError> {
        let body = NewVectorStore { name, file_ids };
        let store: ObjectRef = self
            .send(self.request(Method::POST, "/vector_stores").json(&body))
            .await?;
        tracing::debug!(vector_store_id = %store.id, "Created vector store");
        parse_id(VectorStoreId::new(store.id))
    }

    async fn create_assistant(
        &self,
        request: CreateAssistantRequest,
    ) -> Result<AssistantId, AssistantApiError> {
        let body = NewAssistant {
            model: &request.model,
            name: &request.name,
            instructions: &request.instructions,
            tools: vec![ToolSpec {
                kind: "file_search",
            }],
            tool_resources: ToolResources {
                file_search: FileSearchResources {
                    vector_store_ids: &request.vector_store_ids,
                },
            },
        };
        let assistant: ObjectRef = self
            .send(self.request(Method::POST, "/assistants").json(&body))
            .await?;
        tracing::info!(assistant_id = %assistant.id, "Created assistant");
        parse_id(AssistantId::new(assistant.id))
    }
}

// ----- OpenAI API Types -----

#[derive(Debug, Serialize)]
struct NewMessage<'a> {
    role: MessageRole,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct NewRun<'a> {
    assistant_id: &'a str,
}

#[derive(Debug, Serialize)]
struct NewVectorStore<'a> {
    name: &'a str,
    file_ids: &'a [FileId],
}

#[derive(Debug, Serialize)]
struct NewAssistant<'a> {
    model: &'a str,
    name: &'a str,
    instructions: &'a str,
    tools: Vec<ToolSpec>,
    tool_resources: ToolResources<'a>,
}

#[derive(Debug, Serialize)]
struct ToolSpec {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ToolResources<'a> {
    file_search: FileSearchResources<'a>,
}

#[derive(Debug, Serialize)]
struct FileSearchResources<'a> {
    vector_store_ids: &'a [VectorStoreId],
}

#[derive(Debug, Deserialize)]
struct ObjectRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RunObject {
    id: String,
    status: RunStatus,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    data: Vec<MessageObject>,
}

#[derive(Debug, Deserialize)]
struct MessageObject {
    id: String,
    role: MessageRole,
    run_id: Option<String>,
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: TextContent },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct TextContent {
    value: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder_works() {
        let config = OpenAIAssistantConfig::new("test-key")
            .with_base_url("https://custom.api.com/v1/")
            .with_timeout(Duration::from_secs(30));

        assert_eq!(config.base_url, "https://custom.api.com/v1");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.api_key(), "test-key");
    }

    #[test]
    fn from_secret_keeps_defaults() {
        let config = OpenAIAssistantConfig::from_secret(Secret::new("sk-1".to_string()));
        assert_eq!(config.api_key(), "sk-1");
        assert_eq!(config.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn error_message_prefers_structured_body() {
        let body = r#"{"error":{"message":"No thread found with id 'thread_x'.","type":"invalid_request_error"}}"#;
        assert_eq!(
            OpenAIAssistantClient::error_message(body),
            "No thread found with id 'thread_x'."
        );
        assert_eq!(OpenAIAssistantClient::error_message("oops"), "oops");
    }

    #[test]
    fn message_object_takes_first_text_block() {
        let json = r#"{
            "id": "msg_1",
            "role": "assistant",
            "run_id": "run_1",
            "content": [
                {"type": "image_file", "image_file": {"file_id": "file_1"}},
                {"type": "text", "text": {"value": "Hello", "annotations": []}},
                {"type": "text", "text": {"value": "Second", "annotations": []}}
            ]
        }"#;
        let message: MessageObject = serde_json::from_str(json).unwrap();
        let message = to_thread_message(message).unwrap();

        assert_eq!(message.text, "Hello");
        assert_eq!(message.role, MessageRole::Assistant);
        assert_eq!(message.run_id, Some(RunId::new("run_1").unwrap()));
    }

    #[test]
    fn user_message_has_no_run() {
        let json = r#"{"id": "msg_2", "role": "user", "run_id": null, "content": []}"#;
        let message: MessageObject = serde_json::from_str(json).unwrap();
        let message = to_thread_message(message).unwrap();

        assert!(message.run_id.is_none());
        assert_eq!(message.text, "");
    }

    #[test]
    fn assistant_body_attaches_file_search() {
        let stores = vec![VectorStoreId::new("vs_1").unwrap()];
        let body = NewAssistant {
            model: "gpt-4o",
            name: "Support",
            instructions: "Be brief",
            tools: vec![ToolSpec {
                kind: "file_search",
            }],
            tool_resources: ToolResources {
                file_search: FileSearchResources {
                    vector_store_ids: &stores,
                },
            },
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["tools"][0]["type"], "file_search");
        assert_eq!(json["tool_resources"]["file_search"]["vector_store_ids"][0], "vs_1");
    }
}

//! AssistantResolver - Resolve or provision the assistant used for runs.
//!
//! A configured assistant id is used as-is. Without one, the first caller
//! provisions an assistant (instructions, knowledge upload, vector store,
//! assistant) and every later caller in the process reuses it.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::config::{AssistantConfig, StorageConfig};
use crate::domain::foundation::{AssistantId, ErrorCode};
use crate::ports::{AssistantApi, AssistantApiError, CreateAssistantRequest};

const KNOWLEDGE_STORE_NAME: &str = "Knowledge Base";

/// What to create when provisioning.
#[derive(Debug, Clone)]
pub struct ProvisionSettings {
    pub instructions_path: PathBuf,
    pub knowledge_path: PathBuf,
    pub model: String,
    pub name: String,
}

impl ProvisionSettings {
    pub fn from_config(assistant: &AssistantConfig, storage: &StorageConfig) -> Self {
        Self {
            instructions_path: storage.instructions_path(),
            knowledge_path: storage.knowledge_path(),
            model: assistant.model.clone(),
            name: assistant.name.clone(),
        }
    }
}

/// Error type for resolving the assistant
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// A provisioning document does not exist
    #[error("provisioning file not found: {}", .0.display())]
    FileMissing(PathBuf),

    /// A provisioning document could not be read
    #[error("failed to read {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    /// The assistant service rejected a provisioning call
    #[error("assistant service error: {0}")]
    Remote(#[from] AssistantApiError),
}

impl ProvisionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ProvisionError::FileMissing(_) => ErrorCode::NotFound,
            ProvisionError::Io { .. } => ErrorCode::StorageError,
            ProvisionError::Remote(AssistantApiError::NotFound(_)) => ErrorCode::NotFound,
            ProvisionError::Remote(AssistantApiError::Timeout { .. }) => ErrorCode::Timeout,
            ProvisionError::Remote(_) => ErrorCode::RemoteServiceError,
        }
    }
}

/// Resolves the assistant id, provisioning at most once per process
pub struct AssistantResolver {
    api: Arc<dyn AssistantApi>,
    settings: ProvisionSettings,
    fixed: Option<AssistantId>,
    provisioned: OnceCell<AssistantId>,
}

impl AssistantResolver {
    pub fn new(api: Arc<dyn AssistantApi>, settings: ProvisionSettings) -> Self {
        Self {
            api,
            settings,
            fixed: None,
            provisioned: OnceCell::new(),
        }
    }

    /// Use a pre-provisioned assistant instead of creating one
    pub fn with_fixed_assistant(mut self, assistant_id: AssistantId) -> Self {
        self.fixed = Some(assistant_id);
        self
    }

    /// Returns the configured assistant, or the one provisioned by this process
    pub async fn resolve(&self) -> Result<AssistantId, ProvisionError> {
        if let Some(id) = &self.fixed {
            return Ok(id.clone());
        }
        self.provisioned
            .get_or_try_init(|| self.provision())
            .await
            .cloned()
    }

    /// Creates a fresh assistant with file search over the knowledge document
    ///
    /// Every call creates new remote resources.
    #[tracing::instrument(skip(self), fields(model = %self.settings.model))]
    pub async fn provision(&self) -> Result<AssistantId, ProvisionError> {
        let instructions = read_document(&self.settings.instructions_path).await?;
        let knowledge = read_document(&self.settings.knowledge_path).await?;

        let file_name = self
            .settings
            .knowledge_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "knowledge.txt".to_string());

        let file_id = self.api.upload_file(&file_name, knowledge).await?;
        let vector_store_id = self
            .api
            .create_vector_store(KNOWLEDGE_STORE_NAME, &[file_id])
            .await?;

        let request = CreateAssistantRequest::new(
            &self.settings.name,
            &self.settings.model,
            String::from_utf8_lossy(&instructions),
        )
        .with_vector_store(vector_store_id);
        let assistant_id = self.api.create_assistant(request).await?;

        tracing::info!(assistant_id = %assistant_id, "Provisioned assistant");
        Ok(assistant_id)
    }
}

async fn read_document(path: &Path) -> Result<Vec<u8>, ProvisionError> {
    tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            tracing::error!(path = %path.display(), "Provisioning file not found");
            ProvisionError::FileMissing(path.to_path_buf())
        } else {
            ProvisionError::Io {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::assistant::{MockAssistantApi, MockCall, MockOperation};
    use tempfile::TempDir;

    fn settings(dir: &TempDir) -> ProvisionSettings {
        ProvisionSettings {
            instructions_path: dir.path().join("files/instructions.txt"),
            knowledge_path: dir.path().join("files/knowledge.txt"),
            model: "gpt-4o".to_string(),
            name: "Customer Support Assistant".to_string(),
        }
    }

    fn write_documents(dir: &TempDir) {
        std::fs::create_dir_all(dir.path().join("files")).unwrap();
        std::fs::write(dir.path().join("files/instructions.txt"), "Answer briefly.").unwrap();
        std::fs::write(dir.path().join("files/knowledge.txt"), "Open 9-5.").unwrap();
    }

    #[tokio::test]
    async fn fixed_assistant_skips_provisioning() {
        let dir = TempDir::new().unwrap();
        let api = MockAssistantApi::new();
        let resolver = AssistantResolver::new(Arc::new(api.clone()), settings(&dir))
            .with_fixed_assistant(AssistantId::new("asst_fixed").unwrap());

        let id = resolver.resolve().await.unwrap();

        assert_eq!(id.as_str(), "asst_fixed");
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn provision_creates_file_store_and_assistant() {
        let dir = TempDir::new().unwrap();
        write_documents(&dir);
        let api = MockAssistantApi::new();
        let resolver = AssistantResolver::new(Arc::new(api.clone()), settings(&dir));

        resolver.provision().await.unwrap();

        let calls = api.calls();
        assert_eq!(calls.len(), 3);
        assert!(matches!(
            &calls[0],
            MockCall::UploadFile { file_name, size: 9 } if file_name == "knowledge.txt"
        ));
        assert!(matches!(&calls[1], MockCall::CreateVectorStore { file_ids, .. } if file_ids.len() == 1));
        match &calls[2] {
            MockCall::CreateAssistant(request) => {
                assert_eq!(request.instructions, "Answer briefly.");
                assert_eq!(request.model, "gpt-4o");
                assert_eq!(request.vector_store_ids.len(), 1);
            }
            other => panic!("unexpected call: {:?}", other),
        }
    }

    #[tokio::test]
    async fn resolve_provisions_once() {
        let dir = TempDir::new().unwrap();
        write_documents(&dir);
        let api = MockAssistantApi::new();
        let resolver = Arc::new(AssistantResolver::new(Arc::new(api.clone()), settings(&dir)));

        let (first, second) = tokio::join!(resolver.resolve(), resolver.resolve());

        assert_eq!(first.unwrap(), second.unwrap());
        assert_eq!(api.call_count(MockOperation::CreateAssistant), 1);
    }

    #[tokio::test]
    async fn provision_twice_creates_two_assistants() {
        let dir = TempDir::new().unwrap();
        write_documents(&dir);
        let api = MockAssistantApi::new();
        let resolver = AssistantResolver::new(Arc::new(api.clone()), settings(&dir));

        let first = resolver.provision().await.unwrap();
        let second = resolver.provision().await.unwrap();

        assert_ne!(first, second);
        assert_eq!(api.call_count(MockOperation::UploadFile), 2);
    }

    #[tokio::test]
    async fn missing_instructions_is_not_found() {
        let dir = TempDir::new().unwrap();
        let api = MockAssistantApi::new();
        let resolver = AssistantResolver::new(Arc::new(api.clone()), settings(&dir));

        let err = resolver.resolve().await.unwrap_err();

        assert!(matches!(err, ProvisionError::FileMissing(_)));
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_provisioning_is_retried_on_next_resolve() {
        let dir = TempDir::new().unwrap();
        write_documents(&dir);
        let api = MockAssistantApi::new()
            .with_failure(MockOperation::UploadFile, AssistantApiError::unavailable("down"));
        let resolver = AssistantResolver::new(Arc::new(api.clone()), settings(&dir));

        let err = resolver.resolve().await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::RemoteServiceError);

        api.clear_failure(MockOperation::UploadFile);
        assert!(resolver.resolve().await.is_ok());
    }
}

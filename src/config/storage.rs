//! Local file layout configuration

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::error::ValidationError;

/// How new contact records are written to the ledger
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LedgerMode {
    /// Keep existing records and add the new line
    #[default]
    Append,
    /// Rewrite the ledger so it holds only the new line
    Replace,
}

/// Paths to the contact ledger and the provisioning documents
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory the relative paths below are resolved against
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_contacts_file")]
    pub contacts_file: PathBuf,

    #[serde(default = "default_instructions_file")]
    pub instructions_file: PathBuf,

    #[serde(default = "default_knowledge_file")]
    pub knowledge_file: PathBuf,

    #[serde(default)]
    pub ledger_mode: LedgerMode,
}

impl StorageConfig {
    pub fn contacts_path(&self) -> PathBuf {
        self.data_dir.join(&self.contacts_file)
    }

    pub fn instructions_path(&self) -> PathBuf {
        self.data_dir.join(&self.instructions_file)
    }

    pub fn knowledge_path(&self) -> PathBuf {
        self.data_dir.join(&self.knowledge_file)
    }

    /// Validate storage configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let paths: [(&'static str, &Path); 4] = [
            ("storage.data_dir", &self.data_dir),
            ("storage.contacts_file", &self.contacts_file),
            ("storage.instructions_file", &self.instructions_file),
            ("storage.knowledge_file", &self.knowledge_file),
        ];
        match paths.iter().find(|(_, path)| path.as_os_str().is_empty()) {
            Some((name, _)) => Err(ValidationError::EmptyPath(name)),
            None => Ok(()),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            contacts_file: default_contacts_file(),
            instructions_file: default_instructions_file(),
            knowledge_file: default_knowledge_file(),
            ledger_mode: LedgerMode::default(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_contacts_file() -> PathBuf {
    PathBuf::from("collected_data/customer_data.txt")
}

fn default_instructions_file() -> PathBuf {
    PathBuf::from("files/instructions.txt")
}

fn default_knowledge_file() -> PathBuf {
    PathBuf::from("files/knowledge.txt")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_defaults() {
        let config = StorageConfig::default();
        assert_eq!(config.ledger_mode, LedgerMode::Append);
        assert_eq!(
            config.contacts_path(),
            Path::new(".").join("collected_data/customer_data.txt")
        );
    }

    #[test]
    fn test_paths_resolve_against_data_dir() {
        let config = StorageConfig {
            data_dir: PathBuf::from("/srv/relay"),
            ..Default::default()
        };
        assert_eq!(
            config.instructions_path(),
            PathBuf::from("/srv/relay/files/instructions.txt")
        );
        assert_eq!(
            config.knowledge_path(),
            PathBuf::from("/srv/relay/files/knowledge.txt")
        );
    }

    #[test]
    fn test_validation_rejects_empty_paths() {
        assert!(StorageConfig::default().validate().is_ok());

        let config = StorageConfig {
            contacts_file: PathBuf::new(),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::EmptyPath("storage.contacts_file"))
        );

        let config = StorageConfig {
            data_dir: PathBuf::from(""),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::EmptyPath("storage.data_dir")));
    }

    #[test]
    fn test_ledger_mode_deserializes_lowercase() {
        let mode: LedgerMode = serde_json::from_str("\"replace\"").unwrap();
        assert_eq!(mode, LedgerMode::Replace);
    }
}

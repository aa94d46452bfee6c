//! Assistant service configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Hosted assistant service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantConfig {
    /// API key for the assistant service
    pub api_key: Option<Secret<String>>,

    /// Base URL of the service API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Pre-provisioned assistant; when unset one is created on first use
    pub assistant_id: Option<String>,

    /// Model used when provisioning an assistant
    #[serde(default = "default_model")]
    pub model: String,

    /// Display name used when provisioning an assistant
    #[serde(default = "default_name")]
    pub name: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl AssistantConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check if an API key is configured
    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().trim().is_empty())
    }

    /// Configured assistant id, ignoring blank values
    pub fn fixed_assistant_id(&self) -> Option<&str> {
        self.assistant_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Validate assistant configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.has_api_key() {
            return Err(ValidationError::MissingRequired("ASSISTANT_RELAY__ASSISTANT__API_KEY"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidBaseUrl);
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            assistant_id: None,
            model: default_model(),
            name: default_name(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_name() -> String {
    "Customer Support Assistant".to_string()
}

fn default_timeout() -> u64 {
    60
}

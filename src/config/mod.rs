//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `ASSISTANT_RELAY` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use assistant_relay::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {:?}", config.server.socket_addr());
//! ```

mod assistant;
mod error;
mod relay;
mod server;
mod storage;

pub use assistant::AssistantConfig;
pub use error::{ConfigError, ValidationError};
pub use relay::RelayConfig;
pub use server::{Environment, ServerConfig};
pub use storage::{LedgerMode, StorageConfig};

use secrecy::Secret;
use serde::Deserialize;

/// Environment variables consulted, in order, when no prefixed API key is set.
pub const FALLBACK_API_KEY_VARS: [&str; 2] = ["OPENAI_API_KEY", "REACT_APP_OPENAI_API_KEY"];

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
/// Every section has defaults; only the assistant API key is required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// Hosted assistant service (API key, base URL, assistant)
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// Run polling and message sequencing
    #[serde(default)]
    pub relay: RelayConfig,

    /// Contact ledger and provisioning documents
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `ASSISTANT_RELAY` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    /// 5. Falls back to `OPENAI_API_KEY`, then `REACT_APP_OPENAI_API_KEY`,
    ///    when no API key was given
    ///
    /// # Environment Variable Format
    ///
    /// - `ASSISTANT_RELAY__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `ASSISTANT_RELAY__ASSISTANT__API_KEY=...` -> `assistant.api_key = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let mut config: AppConfig = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("ASSISTANT_RELAY")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        if !config.assistant.has_api_key() {
            config.assistant.api_key = FALLBACK_API_KEY_VARS
                .iter()
                .filter_map(|var| std::env::var(var).ok())
                .find(|key| !key.trim().is_empty())
                .map(Secret::new);
        }

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.assistant.validate()?;
        self.relay.validate()?;
        self.storage.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn set_minimal_env() {
        env::set_var("ASSISTANT_RELAY__ASSISTANT__API_KEY", "sk-test-xxx");
    }

    fn clear_env() {
        env::remove_var("ASSISTANT_RELAY__ASSISTANT__API_KEY");
        env::remove_var("ASSISTANT_RELAY__ASSISTANT__ASSISTANT_ID");
        env::remove_var("ASSISTANT_RELAY__SERVER__PORT");
        env::remove_var("ASSISTANT_RELAY__SERVER__ENVIRONMENT");
        env::remove_var("ASSISTANT_RELAY__RELAY__POLL_INTERVAL_MS");
        env::remove_var("ASSISTANT_RELAY__STORAGE__LEDGER_MODE");
        env::remove_var("ASSISTANT_RELAY__STORAGE__CONTACTS_FILE");
        for var in FALLBACK_API_KEY_VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        set_minimal_env();
        env::set_var("ASSISTANT_RELAY__ASSISTANT__ASSISTANT_ID", "asst_fixed");
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(
            config.assistant.api_key.as_ref().unwrap().expose_secret(),
            "sk-test-xxx"
        );
        assert_eq!(config.assistant.fixed_assistant_id(), Some("asst_fixed"));
    }

    #[test]
    fn test_validate_full_config() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_api_key_fails_validation() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let result = AppConfig::load();

        let config = result.unwrap();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingRequired(_))
        ));
    }

    #[test]
    fn test_fallback_api_key() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("OPENAI_API_KEY", "sk-fallback");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(
            config.assistant.api_key.as_ref().unwrap().expose_secret(),
            "sk-fallback"
        );
    }

    #[test]
    fn test_legacy_frontend_api_key_is_accepted() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("REACT_APP_OPENAI_API_KEY", "sk-legacy");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(
            config.assistant.api_key.as_ref().unwrap().expose_secret(),
            "sk-legacy"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_prefixed_key_wins_over_fallbacks() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        set_minimal_env();
        env::set_var("OPENAI_API_KEY", "sk-fallback");
        env::set_var("REACT_APP_OPENAI_API_KEY", "sk-legacy");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(
            config.assistant.api_key.as_ref().unwrap().expose_secret(),
            "sk-test-xxx"
        );
    }

    #[test]
    fn test_empty_storage_path_fails_validation() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        set_minimal_env();
        env::set_var("ASSISTANT_RELAY__STORAGE__CONTACTS_FILE", "");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(
            config.validate(),
            Err(ValidationError::EmptyPath("storage.contacts_file"))
        );
    }

    #[test]
    fn test_unparseable_value_is_load_error() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        set_minimal_env();
        env::set_var("ASSISTANT_RELAY__SERVER__PORT", "not-a-port");
        let result = AppConfig::load();
        clear_env();

        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }

    #[test]
    fn test_nested_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        set_minimal_env();
        env::set_var("ASSISTANT_RELAY__SERVER__PORT", "3000");
        env::set_var("ASSISTANT_RELAY__SERVER__ENVIRONMENT", "production");
        env::set_var("ASSISTANT_RELAY__RELAY__POLL_INTERVAL_MS", "500");
        env::set_var("ASSISTANT_RELAY__STORAGE__LEDGER_MODE", "replace");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(config.is_production());
        assert_eq!(config.relay.poll_interval_ms, 500);
        assert_eq!(config.storage.ledger_mode, LedgerMode::Replace);
    }
}

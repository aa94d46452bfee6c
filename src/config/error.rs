//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid listen address: {0}")]
    InvalidListenAddress(String),

    #[error("Assistant base URL must start with http:// or https://")]
    InvalidBaseUrl,

    #[error("Assistant request timeout must be greater than zero")]
    InvalidTimeout,

    #[error("Poll interval must be greater than zero")]
    InvalidPollInterval,

    #[error("Poll backoff multiplier must be at least 1.0")]
    InvalidPollMultiplier,

    #[error("Poll max interval is smaller than the initial interval")]
    InvalidPollMaxInterval,

    #[error("Session capacity must be greater than zero")]
    InvalidMaxSessions,

    #[error("Storage path must not be empty: {0}")]
    EmptyPath(&'static str),
}

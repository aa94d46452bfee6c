//! HTTP listener and logging configuration

use serde::Deserialize;
use std::net::{AddrParseError, SocketAddr};

use super::error::ValidationError;

/// Where the relay listens and how it logs
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// `production` switches logs to JSON
    #[serde(default)]
    pub environment: Environment,

    /// Fallback filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Comma-separated browser origins; unset or empty allows any origin
    pub cors_origins: Option<String>,
}

/// Deployment flavour
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Configured origins, trimmed, with blanks dropped
    pub fn cors_origins_list(&self) -> Vec<String> {
        self.cors_origins
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        self.socket_addr()
            .map_err(|e| ValidationError::InvalidListenAddress(e.to_string()))?;
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: Environment::default(),
            log_level: default_log_level(),
            cors_origins: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info,assistant_relay=debug,tower_http=info".to_string()
}

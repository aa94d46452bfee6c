//! Relay workflow configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Run polling and message sequencing
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Delay before the second status check, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Factor applied to the delay after every check (1.0 = fixed cadence)
    #[serde(default = "default_poll_multiplier")]
    pub poll_multiplier: f64,

    /// Upper bound for the delay between checks, in milliseconds
    #[serde(default = "default_poll_max_interval_ms")]
    pub poll_max_interval_ms: u64,

    /// Give up on a run after this many seconds (0 = wait forever)
    #[serde(default = "default_poll_deadline_secs")]
    pub poll_deadline_secs: u64,

    /// Give up on a run after this many status checks
    pub poll_max_attempts: Option<u32>,

    /// Resolve a returning user's thread before sending their message
    #[serde(default)]
    pub resume_before_send: bool,

    /// Forget a session after this many idle seconds (0 = only evict for space)
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,

    /// Most sessions held in memory at once
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl RelayConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_max_interval(&self) -> Duration {
        Duration::from_millis(self.poll_max_interval_ms)
    }

    /// `None` when polling is unbounded in time
    pub fn poll_deadline(&self) -> Option<Duration> {
        (self.poll_deadline_secs > 0).then(|| Duration::from_secs(self.poll_deadline_secs))
    }

    /// `None` when sessions never expire by age
    pub fn session_idle_ttl(&self) -> Option<Duration> {
        (self.session_idle_secs > 0).then(|| Duration::from_secs(self.session_idle_secs))
    }

    /// Validate relay configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.poll_interval_ms == 0 {
            return Err(ValidationError::InvalidPollInterval);
        }
        if !self.poll_multiplier.is_finite() || self.poll_multiplier < 1.0 {
            return Err(ValidationError::InvalidPollMultiplier);
        }
        if self.poll_max_interval_ms < self.poll_interval_ms {
            return Err(ValidationError::InvalidPollMaxInterval);
        }
        if self.max_sessions == 0 {
            return Err(ValidationError::InvalidMaxSessions);
        }
        Ok(())
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            poll_multiplier: default_poll_multiplier(),
            poll_max_interval_ms: default_poll_max_interval_ms(),
            poll_deadline_secs: default_poll_deadline_secs(),
            poll_max_attempts: None,
            resume_before_send: false,
            session_idle_secs: default_session_idle_secs(),
            max_sessions: default_max_sessions(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_poll_multiplier() -> f64 {
    1.0
}

fn default_poll_max_interval_ms() -> u64 {
    2000
}

fn default_poll_deadline_secs() -> u64 {
    300
}

fn default_session_idle_secs() -> u64 {
    3600
}

fn default_max_sessions() -> usize {
    10_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_config_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.poll_max_interval(), Duration::from_secs(2));
        assert_eq!(config.poll_deadline(), Some(Duration::from_secs(300)));
        assert!(config.poll_max_attempts.is_none());
        assert!(!config.resume_before_send);
        assert_eq!(config.session_idle_ttl(), Some(Duration::from_secs(3600)));
        assert_eq!(config.max_sessions, 10_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_deadline_means_unbounded() {
        let config = RelayConfig {
            poll_deadline_secs: 0,
            ..Default::default()
        };
        assert!(config.poll_deadline().is_none());
    }

    #[test]
    fn test_validation_rejects_bad_poll_settings() {
        let config = RelayConfig {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidPollInterval));

        let config = RelayConfig {
            poll_multiplier: 0.5,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidPollMultiplier));

        let config = RelayConfig {
            poll_interval_ms: 5000,
            poll_max_interval_ms: 1000,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidPollMaxInterval));

        let config = RelayConfig {
            max_sessions: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidMaxSessions));
    }

    #[test]
    fn test_zero_idle_secs_disables_expiry() {
        let config = RelayConfig {
            session_idle_secs: 0,
            ..Default::default()
        };
        assert!(config.session_idle_ttl().is_none());
    }
}

//! Remote run lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::RunId;

/// Status of a run as reported by the assistant service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    /// A status this service does not know about yet.
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Returns true while the run has not produced a result yet.
    pub fn is_pending(&self) -> bool {
        matches!(self, RunStatus::Queued | RunStatus::InProgress)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
            RunStatus::Completed => "completed",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Expired => "expired",
            RunStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub id: RunId,
    pub status: RunStatus,
}

impl Run {
    pub fn new(id: RunId, status: RunStatus) -> Self {
        Self { id, status }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_queued_and_in_progress_are_pending() {
        assert!(RunStatus::Queued.is_pending());
        assert!(RunStatus::InProgress.is_pending());

        for status in [
            RunStatus::RequiresAction,
            RunStatus::Cancelling,
            RunStatus::Cancelled,
            RunStatus::Failed,
            RunStatus::Completed,
            RunStatus::Incomplete,
            RunStatus::Expired,
            RunStatus::Unknown,
        ] {
            assert!(!status.is_pending(), "{} should be terminal", status);
        }
    }

    #[test]
    fn deserializes_wire_names() {
        let status: RunStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(status, RunStatus::InProgress);

        let status: RunStatus = serde_json::from_str("\"requires_action\"").unwrap();
        assert_eq!(status, RunStatus::RequiresAction);
    }

    #[test]
    fn unrecognised_status_is_unknown() {
        let status: RunStatus = serde_json::from_str("\"paused\"").unwrap();
        assert_eq!(status, RunStatus::Unknown);
    }
}

//! RunPoller - Wait for a remote run to leave the pending states.
//!
//! The poller checks the run, sleeps, and checks again until the status is
//! neither `queued` nor `in_progress`. The wait is bounded by an optional
//! deadline and attempt cap, and can be aborted through a
//! `CancellationToken`.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

use crate::config::RelayConfig;
use crate::domain::conversation::Run;
use crate::domain::foundation::{RunId, ThreadId};
use crate::ports::{AssistantApi, AssistantApiError};

/// How often and for how long to check a run.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Sleep before the second check.
    pub initial_interval: Duration,
    /// Factor applied to the sleep after each check.
    pub multiplier: f64,
    /// Cap on the sleep between checks.
    pub max_interval: Duration,
    /// Total wait budget; `None` waits forever.
    pub deadline: Option<Duration>,
    /// Maximum number of status checks.
    pub max_attempts: Option<u32>,
}

impl PollPolicy {
    /// Fixed cadence with no deadline and no attempt cap.
    pub fn fixed(interval: Duration) -> Self {
        Self {
            initial_interval: interval,
            multiplier: 1.0,
            max_interval: interval,
            deadline: None,
            max_attempts: None,
        }
    }

    pub fn with_backoff(mut self, multiplier: f64, max_interval: Duration) -> Self {
        self.multiplier = multiplier;
        self.max_interval = max_interval;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Sleep to use after `current`, never above `max_interval`.
    pub fn next_interval(&self, current: Duration) -> Duration {
        Duration::try_from_secs_f64(current.as_secs_f64() * self.multiplier)
            .map_or(self.max_interval, |next| next.min(self.max_interval))
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from(&RelayConfig::default())
    }
}

impl From<&RelayConfig> for PollPolicy {
    fn from(config: &RelayConfig) -> Self {
        Self {
            initial_interval: config.poll_interval(),
            multiplier: config.poll_multiplier,
            max_interval: config.poll_max_interval(),
            deadline: config.poll_deadline(),
            max_attempts: config.poll_max_attempts,
        }
    }
}

/// Why a wait ended without a settled run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PollError {
    #[error("run still pending after {attempts} checks ({elapsed:?})")]
    Timeout { attempts: u32, elapsed: Duration },

    #[error("wait for run was cancelled")]
    Cancelled,

    #[error(transparent)]
    Api(#[from] AssistantApiError),
}

/// Polls run status through the assistant port.
pub struct RunPoller {
    api: Arc<dyn AssistantApi>,
    policy: PollPolicy,
}

impl RunPoller {
    pub fn new(api: Arc<dyn AssistantApi>, policy: PollPolicy) -> Self {
        Self { api, policy }
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Checks the run until it settles, returning the settled run.
    pub async fn wait(
        &self,
        thread_id: &ThreadId,
        run_id: &RunId,
        cancel: &CancellationToken,
    ) -> Result<Run, PollError> {
        let started = Instant::now();
        let mut interval = self.policy.initial_interval;
        let mut attempts: u32 = 0;

        loop {
            let run = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PollError::Cancelled),
                result = self.api.retrieve_run(thread_id, run_id) => result?,
            };
            attempts += 1;

            if !run.status.is_pending() {
                tracing::debug!(
                    run_id = %run_id,
                    status = %run.status,
                    attempts,
                    "Run settled"
                );
                return Ok(run);
            }

            let timed_out = self
                .policy
                .max_attempts
                .is_some_and(|max| attempts >= max)
                || self
                    .policy
                    .deadline
                    .is_some_and(|deadline| started.elapsed() + interval > deadline);
            if timed_out {
                return Err(PollError::Timeout {
                    attempts,
                    elapsed: started.elapsed(),
                });
            }

            tracing::trace!(run_id = %run_id, status = %run.status, ?interval, "Run pending");
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PollError::Cancelled),
                _ = sleep(interval) => {}
            }
            interval = self.policy.next_interval(interval);
        }
    }
}

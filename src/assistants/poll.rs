//! Bounded exponential-backoff polling of a run until it reaches a terminal state.

use std::time::Duration;

use tracing::{debug, warn};

use super::types::{Run, RunStatus};
use super::ConversationService;
use crate::error::{AdapterError, Result};

/// Attempt budget and backoff base for status checks.
///
/// Attempt `n` (zero based) waits `base_backoff * 2^n` before querying, so a full budget of
/// `N` attempts waits `base_backoff * (2^N - 1)` in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    max_attempts: u32,
    base_backoff: Duration,
}

impl PollPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
    pub const DEFAULT_BASE_BACKOFF_MS: u64 = 1000;

    pub fn new(max_attempts: u32, base_backoff: Duration) -> Self {
        PollPolicy {
            max_attempts,
            base_backoff,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_backoff(&self) -> Duration {
        self.base_backoff
    }

    /// Wait before the zero-based attempt `attempt`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_backoff.saturating_mul(factor)
    }

    /// Sum of all waits when every attempt is used.
    pub fn total_wait(&self) -> Duration {
        (0..self.max_attempts).map(|a| self.delay(a)).sum()
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy::new(
            Self::DEFAULT_MAX_ATTEMPTS,
            Duration::from_millis(Self::DEFAULT_BASE_BACKOFF_MS),
        )
    }
}

fn settle(run: Run) -> Result<Option<Run>> {
    if run.status.is_completed() {
        Ok(Some(run))
    } else if run.status.is_failure() {
        Err(AdapterError::RunFailed {
            status: run.status.to_string(),
        })
    } else {
        Ok(None)
    }
}

/// Polls `run` until it completes.
///
/// A run that is already terminal is settled without any status query. Transport errors and
/// 429/5xx answers consume an attempt; any other error aborts immediately.
pub async fn poll_run(
    service: &dyn ConversationService,
    thread_id: &str,
    run: Run,
    policy: &PollPolicy,
) -> Result<Run> {
    let run_id = run.id.clone();
    let mut last_status: RunStatus = run.status.clone();
    if let Some(done) = settle(run)? {
        return Ok(done);
    }

    for attempt in 0..policy.max_attempts() {
        tokio::time::sleep(policy.delay(attempt)).await;

        match service.get_run(thread_id, &run_id).await {
            Ok(current) => {
                debug!(run_id = %run_id, attempt = attempt + 1, status = %current.status, "run status");
                last_status = current.status.clone();
                if let Some(done) = settle(current)? {
                    return Ok(done);
                }
            }
            Err(e) if e.is_transient() => {
                warn!(run_id = %run_id, attempt = attempt + 1, error = %e, "status check failed, retrying");
            }
            Err(e) => return Err(e),
        }
    }

    Err(AdapterError::RunTimedOut {
        attempts: policy.max_attempts(),
        last_status: last_status.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_waits_one_two_four_eight_sixteen_seconds() {
        let policy = PollPolicy::default();
        let delays: Vec<u64> = (0..5).map(|a| policy.delay(a).as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16]);
        assert_eq!(policy.total_wait(), Duration::from_secs(31));
    }

    #[test]
    fn total_wait_is_geometric_sum() {
        for n in 0..8u32 {
            let policy = PollPolicy::new(n, Duration::from_millis(250));
            let expected = 250 * ((1u64 << n) - 1);
            assert_eq!(policy.total_wait(), Duration::from_millis(expected));
        }
    }

    #[test]
    fn huge_attempt_index_saturates() {
        let policy = PollPolicy::new(64, Duration::from_millis(1));
        assert_eq!(policy.delay(40), Duration::from_millis(u32::MAX as u64));
    }
}

//! Per-product retry policy with exponential backoff.

use std::time::Duration;

/// Retry budget for one product attempt.
///
/// Attempts are numbered from 1. Attempt `n >= 2` waits
/// `base_backoff * 2^(n-2)` before it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_backoff: Duration) -> Self {
        Self {
            max_retries,
            base_backoff,
        }
    }

    /// Total attempts including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay to wait before `attempt`. Zero for the first attempt.
    pub fn backoff_before(&self, attempt: u32) -> Duration {
        if attempt < 2 {
            return Duration::ZERO;
        }
        let factor = 1u32.checked_shl(attempt - 2).unwrap_or(u32::MAX);
        self.base_backoff.saturating_mul(factor)
    }

    /// Retries consumed once `attempt` has run.
    pub fn retries_consumed(attempt: u32) -> u32 {
        attempt.saturating_sub(1)
    }

    pub fn has_attempts_after(&self, attempt: u32) -> bool {
        attempt < self.max_attempts()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1_000))
    }
}

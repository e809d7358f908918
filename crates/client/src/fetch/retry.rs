//! Retry policy for transient fetch failures.
//!
//! The decision is a pure function of the error kind and the attempt count;
//! the fetch loop only asks the policy and sleeps.

use std::time::Duration;

use pagetext_core::Error;

/// Exponential backoff retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled on each later one.
    pub base_delay: Duration,
    /// Upper bound for a single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 2, base_delay: Duration::from_millis(200), max_delay: Duration::from_secs(5) }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self { max_retries: 0, ..Default::default() }
    }

    /// Total attempts this policy permits.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Whether to make another attempt after `attempt` attempts failed with `err`.
    pub fn should_retry(&self, err: &Error, attempt: u32) -> bool {
        err.is_retryable() && attempt < self.max_attempts()
    }

    /// Backoff to sleep before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1_u32 << exp).min(self.max_delay)
    }
}

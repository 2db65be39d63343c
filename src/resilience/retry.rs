//! Retry policy for individual remote calls.
//!
//! Retries happen at the item level inside the dispatcher: a retried row keeps
//! its concurrency slot, so the in-flight bound is never exceeded.

use std::time::Duration;

use crate::config::RetryConfig;
use crate::error::Failure;

/// Bounded exponential backoff for retryable failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    min_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            min_delay: Duration::from_millis(config.min_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms.max(config.min_delay_ms)),
        }
    }

    /// A policy that never retries.
    pub fn disabled() -> Self {
        Self::new(&RetryConfig {
            max_retries: 0,
            ..RetryConfig::default()
        })
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Backoff before retry number `attempt + 1`: `min_delay * 2^attempt`, capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let base = self.min_delay.as_millis() as u64;
        let cap = self.max_delay.as_millis() as u64;
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        Duration::from_millis(base.saturating_mul(factor).min(cap))
    }

    /// Delay before the next attempt, or `None` to give up.
    ///
    /// `attempt` counts retries already made (0 after the first failure).
    pub fn should_retry(&self, attempt: u32, failure: &Failure) -> Option<Duration> {
        if attempt >= self.max_retries || !failure.is_retryable() {
            return None;
        }
        Some(self.backoff(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::disabled()
    }
}

//! Retry bookkeeping.
//!
//! # Responsibilities
//! - Carry the per-request attempt/retry counters
//! - Decide whether another same-backend retry or another backend attempt is allowed
//!
//! # Design Decisions
//! - Counters are an immutable value; each step returns a new one
//! - Fixed delay between retries, no backoff
//! - Retry counter resets whenever a new backend is chosen

use std::time::Duration;

use crate::config::RetryConfig;

/// Per-request counters threaded through routing and forwarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestBudget {
    attempts: u32,
    retries: u32,
}

impl RequestBudget {
    /// Distinct backends tried so far, counting the current one.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Same-backend retries within the current attempt.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// One more try against the same backend.
    #[must_use]
    pub fn next_retry(self) -> Self {
        Self {
            retries: self.retries.saturating_add(1),
            ..self
        }
    }

    /// Move on to a different backend.
    #[must_use]
    pub fn next_attempt(self) -> Self {
        Self {
            attempts: self.attempts.saturating_add(1),
            retries: 0,
        }
    }
}

impl Default for RequestBudget {
    fn default() -> Self {
        Self {
            attempts: 1,
            retries: 0,
        }
    }
}

/// Retry limits and delay, resolved from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// Whether routing may pick a backend for this budget.
    pub fn allows_attempt(&self, budget: RequestBudget) -> bool {
        budget.attempts <= self.max_attempts
    }

    /// Whether the current backend may be tried again.
    pub fn allows_retry(&self, budget: RequestBudget) -> bool {
        budget.retries < self.max_retries
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            max_attempts: config.max_attempts,
        }
    }
}

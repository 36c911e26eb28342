//! crates/study_assistant_core/src/retry.rs
//!
//! Decides whether a failed backend attempt should be retried and after what delay.
//! This module never sleeps; the dispatcher performs the wait.

use std::time::Duration;

use crate::ports::GenerationError;

/// Retry configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Wait before retrying a network failure.
    pub network_delay: Duration,
    /// Wait applied to a rate limit when the backend gave no usable delay.
    pub default_rate_limit_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            network_delay: Duration::from_secs(2),
            default_rate_limit_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub const fn with_network_delay(mut self, delay: Duration) -> Self {
        self.network_delay = delay;
        self
    }

    pub const fn with_default_rate_limit_delay(mut self, delay: Duration) -> Self {
        self.default_rate_limit_delay = delay;
        self
    }

    /// Starts a fresh attempt budget for one request.
    pub fn budget(&self) -> RetryBudget<'_> {
        RetryBudget {
            policy: self,
            remaining: self.max_retries,
        }
    }

    /// The delay to wait before retrying `error`, or `None` when the error is terminal.
    /// Ignores the attempt budget.
    pub fn delay_for(&self, error: &GenerationError) -> Option<Duration> {
        match error {
            GenerationError::NetworkFailure(_) => Some(self.network_delay),
            GenerationError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

/// What the dispatcher should do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    GiveUp,
}

/// Per-request attempt counter.
#[derive(Debug, Clone)]
pub struct RetryBudget<'a> {
    policy: &'a RetryPolicy,
    remaining: u32,
}

impl RetryBudget<'_> {
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Records a failed attempt and decides what happens next.
    pub fn on_failure(&mut self, error: &GenerationError) -> RetryDecision {
        match self.policy.delay_for(error) {
            Some(delay) if self.remaining > 0 => {
                self.remaining -= 1;
                RetryDecision::RetryAfter(delay)
            }
            _ => RetryDecision::GiveUp,
        }
    }
}

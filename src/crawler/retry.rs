//! Retry policy for page fetches
//!
//! The policy is a small state machine: the fetcher reports each failed
//! attempt and the policy answers with either a delay before the next
//! attempt or a terminal give-up.

use crate::config::FetchConfig;
use std::time::Duration;

/// Bounded, linearly backed-off retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts allowed for one URL
    pub max_attempts: u32,

    /// Unit of backoff, also the politeness pause after a success
    pub base_delay: Duration,
}

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep, then make attempt number `next_attempt`
    RetryAfter { delay: Duration, next_attempt: u32 },

    /// No attempts left
    GiveUp { attempts: u32 },
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_millis(config.base_delay_ms),
        )
    }

    /// Decides what follows the failure of the 1-based `attempt`
    ///
    /// Attempt `n` failing waits `base_delay * n` before attempt `n + 1`.
    pub fn on_failure(&self, attempt: u32) -> RetryDecision {
        if attempt >= self.max_attempts {
            RetryDecision::GiveUp { attempts: attempt }
        } else {
            RetryDecision::RetryAfter {
                delay: self.base_delay * attempt,
                next_attempt: attempt + 1,
            }
        }
    }

    /// Pause imposed after every successful request
    pub fn success_pause(&self) -> Duration {
        self.base_delay
    }
}

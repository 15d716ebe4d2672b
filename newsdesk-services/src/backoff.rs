//! Backoff policy for transient provider failures
//!
//! Kept as a standalone object so retry behavior is testable without real
//! timers or network calls.

use std::time::Duration;

/// Bounded exponential backoff
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Growth factor per retry
    pub multiplier: f64,
    /// Ceiling on any single delay
    pub max_delay: Duration,
    /// Retries after the initial attempt; past this the error surfaces
    pub max_retries: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            multiplier: 2.0,
            max_delay: Duration::from_secs(8),
            max_retries: 3,
        }
    }
}

impl BackoffPolicy {
    /// Delay before retry number `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.powi(attempt as i32);
        let delay = self.initial_delay.mul_f64(factor);
        delay.min(self.max_delay)
    }

    /// Whether another retry is allowed after `attempt` failures
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}

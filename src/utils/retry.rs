//! Backoff and polling schedules
//!
//! Submission retries and status polling both take their timing from these
//! values instead of module constants, so tests can shrink them.

use std::time::Duration;

/// Exponential backoff applied while the provider answers HTTP 429
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    /// Total submission attempts, including the first one
    pub max_attempts: usize,
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            initial_interval: Duration::from_secs(30),
            max_interval: Duration::from_secs(300),
            multiplier: 2.0,
        }
    }
}

impl BackoffPolicy {
    /// Interval to wait before the next attempt, given the one just waited
    pub fn next_interval(&self, current: Duration) -> Duration {
        std::cmp::min(
            Duration::from_secs_f64(current.as_secs_f64() * self.multiplier),
            self.max_interval,
        )
    }

    /// Delays slept between attempts if every attempt is throttled
    pub fn schedule(&self) -> Vec<Duration> {
        let retries = self.max_attempts.saturating_sub(1);
        let mut delays = Vec::with_capacity(retries);
        let mut interval = std::cmp::min(self.initial_interval, self.max_interval);
        for _ in 0..retries {
            delays.push(interval);
            interval = self.next_interval(interval);
        }
        delays
    }
}

/// Cadence and budget for waiting on an asynchronous operation
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            timeout: Duration::from_secs(900),
        }
    }
}

//! Exponential delay between upsert retries
//!
//! Each call to `next_delay` returns the current delay and multiplies it for
//! the following attempt, never exceeding `max_delay`.
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// No waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }
}

pub struct Backoff {
    max_delay: Duration,
    current_delay: Duration,
    /// Retries taken so far
    pub attempt: u32,
}

impl Backoff {
    pub fn new(policy: &RetryPolicy) -> Self {
        Self {
            max_delay: policy.max_delay,
            current_delay: policy.initial_delay.min(policy.max_delay),
            attempt: 0,
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current_delay;
        self.attempt += 1;
        self.current_delay = (self.current_delay * 2).min(self.max_delay);
        delay
    }

    pub fn exceeded_max_attempts(&self, max: u32) -> bool {
        self.attempt >= max
    }
}

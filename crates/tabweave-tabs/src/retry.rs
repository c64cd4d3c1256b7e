//! Bounded delay schedule for re-reading a page title.

use std::time::{Duration, Instant};

/// One attempt per delay; attempt `n` is made `delays[n]` after the
/// previous one (or after the trigger, for the first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
}

impl RetryPolicy {
    pub fn new(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    pub fn from_millis(delays: &[u64]) -> Self {
        Self::new(delays.iter().copied().map(Duration::from_millis).collect())
    }

    pub fn delay(&self, attempt: usize) -> Option<Duration> {
        self.delays.get(attempt).copied()
    }

    pub fn attempts(&self) -> usize {
        self.delays.len()
    }

    /// Deadline of `attempt` measured from `now`, if the policy allows it.
    pub fn deadline(&self, attempt: usize, now: Instant) -> Option<Instant> {
        self.delay(attempt).map(|d| now + d)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_millis(&[200, 300, 300, 300])
    }
}

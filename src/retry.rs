//! Bounded retry for status queries.
//!
//! Listings may lag behind writes for a short while. A status query that
//! finds nothing tries again after a short gap, a fixed number of times,
//! and then gives up.

use std::time::Duration;

/// Number of attempts a status query makes. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempts(u32);

impl Attempts {
    /// Attempts made by default.
    pub const DEFAULT: Attempts = Attempts(2);

    /// Returns `None` for zero.
    pub fn new(count: u32) -> Option<Self> {
        (count > 0).then_some(Self(count))
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl Default for Attempts {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// How a status query retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: Attempts,
    /// Sleep between consecutive attempts.
    pub gap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: Attempts::DEFAULT,
            gap: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting.
    pub fn once() -> Self {
        Self {
            attempts: Attempts(1),
            gap: Duration::ZERO,
        }
    }

    /// Longest time a query spends sleeping.
    pub fn max_wait(&self) -> Duration {
        self.gap * (self.attempts.get() - 1)
    }
}

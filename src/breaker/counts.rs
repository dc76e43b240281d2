//! Request outcome tallies.
//!
//! # Responsibilities
//! - Count requests, successes and failures since the last reset
//! - Track the current unbroken run of successes or failures
//!
//! # Design Decisions
//! - `Counts` is a plain `Copy` value; each state wraps its own in a mutex
//! - Counters saturate instead of wrapping

use serde::{Deserialize, Serialize};

/// Numbers of requests and their successes/failures.
///
/// The breaker clears its counts on every state change and, while closed,
/// at every configured interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    /// Calls admitted since the last reset.
    pub requests: u32,
    /// Calls that completed as a success.
    pub total_successes: u32,
    /// Calls that failed, panicked or were cancelled.
    pub total_failures: u32,
    /// Current run of successes; zeroed by a failure.
    pub consecutive_successes: u32,
    /// Current run of failures; zeroed by a success.
    pub consecutive_failures: u32,
}

impl Counts {
    pub fn new(
        requests: u32,
        total_successes: u32,
        total_failures: u32,
        consecutive_successes: u32,
        consecutive_failures: u32,
    ) -> Self {
        Self {
            requests,
            total_successes,
            total_failures,
            consecutive_successes,
            consecutive_failures,
        }
    }

    pub(crate) fn on_request(&mut self) {
        self.requests = self.requests.saturating_add(1);
    }

    pub(crate) fn on_success(&mut self) {
        self.total_successes = self.total_successes.saturating_add(1);
        self.consecutive_successes = self.consecutive_successes.saturating_add(1);
        self.consecutive_failures = 0;
    }

    pub(crate) fn on_failure(&mut self) {
        self.total_failures = self.total_failures.saturating_add(1);
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.consecutive_successes = 0;
    }

    pub(crate) fn clear(&mut self) {
        *self = Counts::default();
    }

    /// True when no request has been recorded since the last reset.
    pub fn is_empty(&self) -> bool {
        *self == Counts::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_resets_consecutive_failures() {
        let mut c = Counts::default();
        c.on_request();
        c.on_failure();
        c.on_request();
        c.on_failure();
        assert_eq!(c, Counts::new(2, 0, 2, 0, 2));

        c.on_request();
        c.on_success();
        assert_eq!(c, Counts::new(3, 1, 2, 1, 0));
    }

    #[test]
    fn test_failure_resets_consecutive_successes() {
        let mut c = Counts::default();
        for _ in 0..3 {
            c.on_request();
            c.on_success();
        }
        c.on_request();
        c.on_failure();
        assert_eq!(c, Counts::new(4, 3, 1, 0, 1));
    }

    #[test]
    fn test_clear() {
        let mut c = Counts::new(7, 3, 4, 0, 4);
        c.clear();
        assert!(c.is_empty());
    }

    #[test]
    fn test_saturates_instead_of_wrapping() {
        let mut c = Counts::new(u32::MAX, u32::MAX, 0, u32::MAX, 0);
        c.on_request();
        c.on_success();
        assert_eq!(c.requests, u32::MAX);
        assert_eq!(c.total_successes, u32::MAX);
        assert_eq!(c.consecutive_successes, u32::MAX);
    }
}

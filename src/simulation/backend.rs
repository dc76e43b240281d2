//! Synthetic dependency with configurable failures.

use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tokio::time::Instant;

use crate::config::SimulationConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("backend unavailable (outage)")]
    Outage,

    #[error("backend request failed")]
    Failed,
}

/// A dependency that fails at random and goes fully down for a window.
#[derive(Debug)]
pub struct FlakyBackend {
    failure_rate: f64,
    outage_start: Duration,
    outage_end: Duration,
    latency: Duration,
    started: Instant,
}

impl FlakyBackend {
    pub fn new(config: &SimulationConfig) -> Self {
        let outage_start = Duration::from_secs(config.outage_start_secs);
        Self {
            failure_rate: config.failure_rate.clamp(0.0, 1.0),
            outage_start,
            outage_end: outage_start + Duration::from_secs(config.outage_secs),
            latency: Duration::from_millis(config.latency_ms),
            started: Instant::now(),
        }
    }

    pub fn in_outage(&self, elapsed: Duration) -> bool {
        elapsed >= self.outage_start && elapsed < self.outage_end
    }

    /// Outcome for a call made `elapsed` into the run, given a uniform roll in [0, 1).
    fn outcome(&self, elapsed: Duration, roll: f64) -> Result<(), BackendError> {
        if self.in_outage(elapsed) {
            Err(BackendError::Outage)
        } else if roll < self.failure_rate {
            Err(BackendError::Failed)
        } else {
            Ok(())
        }
    }

    /// Simulate one call, returning the elapsed run time in milliseconds on success.
    pub async fn call(&self) -> Result<u64, BackendError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let elapsed = self.started.elapsed();
        let roll: f64 = rand::thread_rng().gen();
        self.outcome(elapsed, roll)?;
        Ok(elapsed.as_millis() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(failure_rate: f64, outage_start_secs: u64, outage_secs: u64) -> FlakyBackend {
        FlakyBackend::new(&SimulationConfig {
            failure_rate,
            outage_start_secs,
            outage_secs,
            latency_ms: 0,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_outage_window_always_fails() {
        let b = backend(0.0, 5, 10);
        assert_eq!(b.outcome(Duration::from_secs(4), 0.99), Ok(()));
        assert_eq!(
            b.outcome(Duration::from_secs(5), 0.99),
            Err(BackendError::Outage)
        );
        assert_eq!(
            b.outcome(Duration::from_millis(14_999), 0.99),
            Err(BackendError::Outage)
        );
        assert_eq!(b.outcome(Duration::from_secs(15), 0.99), Ok(()));
    }

    #[tokio::test]
    async fn test_failure_rate_applies_outside_outage() {
        let b = backend(0.25, 0, 0);
        assert_eq!(
            b.outcome(Duration::from_secs(1), 0.1),
            Err(BackendError::Failed)
        );
        assert_eq!(b.outcome(Duration::from_secs(1), 0.3), Ok(()));
    }

    #[tokio::test]
    async fn test_certain_failure() {
        let b = backend(1.0, 0, 0);
        assert_eq!(b.call().await, Err(BackendError::Failed));
    }
}

//! Breaker error types.

use thiserror::Error;

/// Error returned by [`CircuitBreaker::execute`](super::CircuitBreaker::execute).
///
/// `Open` means the work never ran. `Inner` carries the work's own error
/// unchanged, whether or not it was counted as a failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExecuteError<E> {
    #[error("circuit breaker is open")]
    Open,

    #[error(transparent)]
    Inner(E),
}

impl<E> ExecuteError<E> {
    /// True when the breaker rejected the call without running the work.
    pub fn is_open(&self) -> bool {
        matches!(self, ExecuteError::Open)
    }

    /// The work's own error, or `None` for a rejection.
    pub fn into_inner(self) -> Option<E> {
        match self {
            ExecuteError::Open => None,
            ExecuteError::Inner(err) => Some(err),
        }
    }
}

/// Error constructing a breaker.
#[derive(Debug, Error)]
pub enum BreakerError {
    /// Timers are Tokio tasks, so the breaker must be built inside a runtime.
    #[error("circuit breaker must be created inside a Tokio runtime: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

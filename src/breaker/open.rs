//! Open state: calls are rejected until the open timeout elapses.

use std::sync::Arc;

use super::counts::Counts;
use super::error::ExecuteError;
use super::state::{State, StateType, Tally};
use super::timer::Timer;
use super::Shared;
use crate::observability::metrics::{self, Outcome};

#[derive(Debug, Default)]
pub(crate) struct OpenState {
    tally: Tally,
    timeout: Timer,
}

impl OpenState {
    /// Rejects without running the work or touching counts.
    pub(crate) fn execute<T, E>(&self, breaker: &Shared) -> Result<T, ExecuteError<E>> {
        tracing::debug!(breaker = %breaker.settings.name, "Rejected: circuit open");
        metrics::record_request(&breaker.settings.name, Outcome::Rejected);
        Err(ExecuteError::Open)
    }
}

impl State for OpenState {
    fn state_type(&self) -> StateType {
        StateType::Open
    }

    fn counts(&self) -> Counts {
        self.tally.snapshot()
    }

    fn on_enter(&self, breaker: &Arc<Shared>, generation: u64) {
        self.tally.activate(generation);

        let weak = Arc::downgrade(breaker);
        let timeout = breaker.settings.open_timeout;
        self.timeout.start(&breaker.runtime, async move {
            tokio::time::sleep(timeout).await;
            if let Some(breaker) = weak.upgrade() {
                breaker.transition_from(generation, StateType::HalfOpen);
            }
        });
    }

    fn on_leave(&self) {
        self.tally.retire();
        self.timeout.cancel();
    }
}

//! Half-open state: probes decide between closing and re-opening.
//!
//! A probe that finishes after the generation moved on (another probe
//! already closed or re-opened the breaker, or it was reset) returns its
//! result untouched and leaves no trace in the counts.

use std::future::Future;
use std::sync::Arc;

use super::counts::Counts;
use super::error::ExecuteError;
use super::guard::OutcomeGuard;
use super::state::{State, StateType, Tally};
use super::Shared;
use crate::observability::metrics::{self, Outcome};

#[derive(Debug, Default)]
pub(crate) struct HalfOpenState {
    tally: Tally,
}

impl HalfOpenState {
    pub(crate) async fn execute<T, E, F, Fut>(
        &self,
        breaker: &Arc<Shared>,
        generation: u64,
        work: F,
    ) -> Result<T, ExecuteError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error + 'static,
    {
        self.tally.update(generation, Counts::on_request);

        let guard = OutcomeGuard::new(&breaker.settings.name, || {
            self.record_failure(breaker, generation)
        });
        let result = work().await;
        guard.disarm();

        if breaker.generation() != generation {
            tracing::debug!(
                breaker = %breaker.settings.name,
                generation,
                "Discarding outcome of probe from a retired generation"
            );
            return result.map_err(ExecuteError::Inner);
        }

        if breaker.settings.is_success(&result) {
            self.record_success(breaker, generation);
        } else {
            self.record_failure(breaker, generation);
        }
        result.map_err(ExecuteError::Inner)
    }

    fn record_success(&self, breaker: &Arc<Shared>, generation: u64) {
        metrics::record_request(&breaker.settings.name, Outcome::Success);

        let Some(counts) = self.tally.update(generation, Counts::on_success) else {
            return;
        };
        if counts.consecutive_successes >= breaker.settings.max_half_open_requests {
            breaker.transition_from(generation, StateType::Closed);
        }
    }

    fn record_failure(&self, breaker: &Arc<Shared>, generation: u64) {
        metrics::record_request(&breaker.settings.name, Outcome::Failure);

        if self.tally.update(generation, Counts::on_failure).is_some() {
            breaker.transition_from(generation, StateType::Open);
        }
    }
}

impl State for HalfOpenState {
    fn state_type(&self) -> StateType {
        StateType::HalfOpen
    }

    fn counts(&self) -> Counts {
        self.tally.snapshot()
    }

    fn on_enter(&self, _breaker: &Arc<Shared>, generation: u64) {
        self.tally.activate(generation);
    }

    fn on_leave(&self) {
        self.tally.retire();
    }
}

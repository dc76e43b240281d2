//! Closed state: every call runs, failures are counted toward a trip.

use std::future::Future;
use std::sync::Arc;

use tokio::time::{self, Instant, MissedTickBehavior};

use super::counts::Counts;
use super::error::ExecuteError;
use super::guard::OutcomeGuard;
use super::state::{State, StateType, Tally};
use super::timer::Timer;
use super::Shared;
use crate::observability::metrics::{self, Outcome};

#[derive(Debug, Default)]
pub(crate) struct ClosedState {
    tally: Tally,
    ticker: Timer,
}

impl ClosedState {
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

        if breaker.settings.is_success(&result) {
            metrics::record_request(&breaker.settings.name, Outcome::Success);
            self.tally.update(generation, Counts::on_success);
        } else {
            self.record_failure(breaker, generation);
        }
        result.map_err(ExecuteError::Inner)
    }

    fn record_failure(&self, breaker: &Arc<Shared>, generation: u64) {
        metrics::record_request(&breaker.settings.name, Outcome::Failure);

        let Some(counts) = self.tally.update(generation, Counts::on_failure) else {
            return;
        };
        if (breaker.settings.ready_to_trip)(counts) {
            tracing::warn!(
                breaker = %breaker.settings.name,
                consecutive_failures = counts.consecutive_failures,
                total_failures = counts.total_failures,
                requests = counts.requests,
                "Trip condition met"
            );
            breaker.transition_from(generation, StateType::Open);
        }
    }

    /// Clear counts for a new generation without leaving the state.
    pub(crate) fn reset(&self, generation: u64) {
        self.tally.activate(generation);
    }
}

impl State for ClosedState {
    fn state_type(&self) -> StateType {
        StateType::Closed
    }

    fn counts(&self) -> Counts {
        self.tally.snapshot()
    }

    fn on_enter(&self, breaker: &Arc<Shared>, generation: u64) {
        self.tally.activate(generation);

        let period = breaker.settings.closed_reset_interval;
        if period.is_zero() {
            return;
        }

        let weak = Arc::downgrade(breaker);
        self.ticker.start(&breaker.runtime, async move {
            // Periods past the clock's range never elapse.
            let Some(start) = Instant::now().checked_add(period) else {
                return;
            };
            let mut ticker = time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut generation = generation;
            loop {
                ticker.tick().await;
                let Some(breaker) = weak.upgrade() else {
                    return;
                };
                match breaker.reset_closed(generation) {
                    Some(next) => generation = next,
                    None => return,
                }
            }
        });
    }

    fn on_leave(&self) {
        self.tally.retire();
        self.ticker.cancel();
    }
}

//! Bookkeeping guard around the protected work.

/// Runs `on_abort` if dropped before [`OutcomeGuard::disarm`] is called.
///
/// Covers both unwinding out of the work (panic) and the execute future
/// being dropped mid-flight (cancellation).
pub(crate) struct OutcomeGuard<'a, F: FnOnce()> {
    breaker: &'a str,
    on_abort: Option<F>,
}

impl<'a, F: FnOnce()> OutcomeGuard<'a, F> {
    pub(crate) fn new(breaker: &'a str, on_abort: F) -> Self {
        Self {
            breaker,
            on_abort: Some(on_abort),
        }
    }

    /// The work completed normally; its result is classified by the caller.
    pub(crate) fn disarm(mut self) {
        self.on_abort = None;
    }
}

impl<F: FnOnce()> Drop for OutcomeGuard<'_, F> {
    fn drop(&mut self) {
        let Some(on_abort) = self.on_abort.take() else {
            return;
        };
        if std::thread::panicking() {
            tracing::warn!(breaker = %self.breaker, "Protected work panicked, recording failure");
        } else {
            tracing::debug!(breaker = %self.breaker, "Protected work cancelled, recording failure");
        }
        on_abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[test]
    fn test_disarmed_guard_does_nothing() {
        let hit = Cell::new(false);
        let guard = OutcomeGuard::new("cb", || hit.set(true));
        guard.disarm();
        assert!(!hit.get());
    }

    #[test]
    fn test_runs_on_unwind_and_keeps_panic() {
        let hit = Cell::new(false);
        let result = catch_unwind(AssertUnwindSafe(|| {
            let _guard = OutcomeGuard::new("cb", || hit.set(true));
            panic!("oops");
        }));
        assert!(result.is_err());
        assert!(hit.get());
    }

    #[test]
    fn test_runs_on_plain_drop() {
        let hit = Cell::new(false);
        drop(OutcomeGuard::new("cb", || hit.set(true)));
        assert!(hit.get());
    }
}

//! Circuit breaker subsystem.
//!
//! # Data Flow
//! ```text
//! caller → CircuitBreaker::execute(work)
//!     → read current epoch (state type + generation), lock-free
//!     → dispatch to that state's execute
//!         closed.rs    run work, count, maybe request Open
//!         open.rs      reject with ExecuteError::Open
//!         half_open.rs run probe, count, request Closed or Open
//!     → transition requests go back through Shared::transition_from
//!
//! Background timers (timer.rs):
//!     closed interval tick → Shared::reset_closed
//!     open timeout         → Shared::transition_from(.., HalfOpen)
//! ```
//!
//! # Design Decisions
//! - Each breaker owns one instance of every state variant; nothing global
//! - Transitions are serialized by a single lock; the notifier runs under it
//! - The generation is a fencing token: counts, timers and transition
//!   requests all name the generation they observed and are dropped on
//!   mismatch
//! - The work itself never runs under a breaker lock

mod closed;
mod counts;
mod error;
mod guard;
mod half_open;
mod open;
mod settings;
mod state;
mod timer;

pub use counts::Counts;
pub use error::{BreakerError, ExecuteError};
pub use settings::{
    default_is_successful, default_ready_to_trip, IsSuccessful, OnStateChange, ReadyToTrip,
    Settings, DEFAULT_INTERVAL, DEFAULT_TIMEOUT,
};
pub use state::StateType;

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;

use crate::observability::metrics;
use closed::ClosedState;
use half_open::HalfOpenState;
use open::OpenState;
use settings::Resolved;
use state::{Epoch, State};

/// Point-in-time view of a breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateReport {
    /// State at the time of the snapshot.
    pub state: StateType,
    /// Counts of that state.
    pub counts: Counts,
    /// Generation of that state.
    pub generation: u64,
}

/// State machine that stops calling a dependency that keeps failing.
///
/// Cloning is cheap and every clone drives the same breaker.
#[derive(Clone)]
pub struct CircuitBreaker {
    shared: Arc<Shared>,
}

pub(crate) struct Shared {
    pub(crate) settings: Resolved,
    pub(crate) runtime: Handle,

    /// Serializes transitions and generation bumps.
    transition: Mutex<()>,
    /// Packed [`Epoch`]; only written while `transition` is held.
    current: AtomicU64,

    closed: ClosedState,
    open: OpenState,
    half_open: HalfOpenState,
}

impl CircuitBreaker {
    /// Create a breaker in the closed state.
    ///
    /// Must be called from within a Tokio runtime; the breaker's timers are
    /// spawned on that runtime.
    pub fn new(settings: Settings) -> Result<Self, BreakerError> {
        let runtime = Handle::try_current()?;
        let shared = Arc::new(Shared {
            settings: settings.resolve(),
            runtime,
            transition: Mutex::new(()),
            current: AtomicU64::new(
                Epoch {
                    state: StateType::Closed,
                    generation: 0,
                }
                .pack(),
            ),
            closed: ClosedState::default(),
            open: OpenState::default(),
            half_open: HalfOpenState::default(),
        });

        {
            let _lock = shared.lock();
            shared.closed.on_enter(&shared, 0);
        }
        metrics::set_state(&shared.settings.name, StateType::Closed);
        tracing::debug!(breaker = %shared.settings.name, "Circuit breaker created");

        Ok(Self { shared })
    }

    /// Name given in [`Settings`].
    pub fn name(&self) -> &str {
        &self.shared.settings.name
    }

    /// Snapshot of the current state's counts.
    pub fn counts(&self) -> Counts {
        let epoch = self.shared.epoch();
        self.shared.state(epoch.state).counts()
    }

    /// Current state type.
    pub fn state(&self) -> StateType {
        self.shared.epoch().state
    }

    /// Incremented on every transition and every closed interval reset.
    pub fn generation(&self) -> u64 {
        self.shared.generation()
    }

    /// Snapshot of the state, its counts and the generation.
    pub fn report(&self) -> StateReport {
        let epoch = self.shared.epoch();
        StateReport {
            state: epoch.state,
            counts: self.shared.state(epoch.state).counts(),
            generation: epoch.generation,
        }
    }

    /// Run `work` if the breaker admits it.
    ///
    /// Returns [`ExecuteError::Open`] immediately while open. Otherwise the
    /// work's own result is returned unchanged, with its error wrapped in
    /// [`ExecuteError::Inner`]. A panic inside the work is recorded as a
    /// failure and then continues unwinding to the caller.
    pub async fn execute<T, E, F, Fut>(&self, work: F) -> Result<T, ExecuteError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error + 'static,
    {
        let shared = &self.shared;
        let epoch = shared.epoch();
        match epoch.state {
            StateType::Closed => shared.closed.execute(shared, epoch.generation, work).await,
            StateType::Open => shared.open.execute(shared),
            StateType::HalfOpen => {
                shared
                    .half_open
                    .execute(shared, epoch.generation, work)
                    .await
            }
        }
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let report = self.report();
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name())
            .field("state", &report.state)
            .field("counts", &report.counts)
            .field("generation", &report.generation)
            .finish()
    }
}

impl Shared {
    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        self.transition.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn epoch(&self) -> Epoch {
        Epoch::unpack(self.current.load(Ordering::Acquire))
    }

    pub(crate) fn generation(&self) -> u64 {
        self.epoch().generation
    }

    fn state(&self, state: StateType) -> &dyn State {
        match state {
            StateType::Closed => &self.closed,
            StateType::Open => &self.open,
            StateType::HalfOpen => &self.half_open,
        }
    }

    /// Move to `target` if the breaker is still in `generation`.
    ///
    /// Returns false when the generation moved on or the breaker is
    /// already in `target`; neither bumps the generation nor notifies.
    pub(crate) fn transition_from(self: &Arc<Self>, generation: u64, target: StateType) -> bool {
        let _lock = self.lock();
        let epoch = self.epoch();
        if epoch.generation != generation {
            return false;
        }
        self.transition_locked(epoch, target)
    }

    /// Move to `target` from whatever the current state is.
    #[cfg(test)]
    pub(crate) fn transition(self: &Arc<Self>, target: StateType) -> bool {
        let _lock = self.lock();
        let epoch = self.epoch();
        self.transition_locked(epoch, target)
    }

    fn transition_locked(self: &Arc<Self>, epoch: Epoch, target: StateType) -> bool {
        if epoch.state == target {
            return false;
        }

        let leaving = self.state(epoch.state);
        debug_assert_eq!(leaving.state_type(), epoch.state);
        leaving.on_leave();

        let next = Epoch {
            state: target,
            generation: epoch.generation + 1,
        };

        let name = &self.settings.name;
        tracing::info!(
            breaker = %name,
            from = %epoch.state,
            to = %target,
            generation = next.generation,
            "Circuit breaker state change"
        );
        metrics::record_transition(name, epoch.state, target);
        if let Some(on_state_change) = &self.settings.on_state_change {
            on_state_change(name, epoch.state, target);
        }

        self.current.store(next.pack(), Ordering::Release);
        self.state(target).on_enter(self, next.generation);
        true
    }

    /// Interval tick while closed: clear counts and bump the generation.
    ///
    /// Returns the new generation, or `None` if the ticker belongs to a
    /// closed epoch that has already ended.
    pub(crate) fn reset_closed(&self, generation: u64) -> Option<u64> {
        let _lock = self.lock();
        let epoch = self.epoch();
        if epoch.state != StateType::Closed || epoch.generation != generation {
            return None;
        }

        let next = Epoch {
            state: StateType::Closed,
            generation: generation + 1,
        };
        self.closed.reset(next.generation);
        self.current.store(next.pack(), Ordering::Release);
        tracing::debug!(
            breaker = %self.settings.name,
            generation = next.generation,
            "Closed interval elapsed, counts cleared"
        );
        Some(next.generation)
    }
}

//! Breaker state machine.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Open: dependency assumed down, requests fail fast
//! - Half-Open: probing whether the dependency recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: trip predicate true after a failure
//! Open → Half-Open: open timeout elapses while still open
//! Half-Open → Closed: consecutive probe successes reach the threshold
//! Half-Open → Open: any probe failure in the current generation
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use super::counts::Counts;
use super::Shared;

/// Operating state of a circuit breaker.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StateType {
    Closed = 0,
    HalfOpen = 1,
    Open = 2,
}

impl StateType {
    pub(crate) fn from_bits(bits: u64) -> Self {
        match bits & 0b11 {
            1 => StateType::HalfOpen,
            2 => StateType::Open,
            _ => StateType::Closed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StateType::Closed => "closed",
            StateType::HalfOpen => "half-open",
            StateType::Open => "open",
        }
    }
}

impl fmt::Display for StateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current state paired with the generation it was entered at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Epoch {
    pub(crate) state: StateType,
    pub(crate) generation: u64,
}

impl Epoch {
    pub(crate) fn pack(self) -> u64 {
        (self.generation << 2) | self.state as u64
    }

    pub(crate) fn unpack(bits: u64) -> Self {
        Self {
            state: StateType::from_bits(bits),
            generation: bits >> 2,
        }
    }
}

/// Lifecycle shared by all state variants.
///
/// Execution is not part of this trait: each variant exposes its own
/// generic `execute` and the coordinator dispatches on [`StateType`].
pub(crate) trait State: Send + Sync {
    fn state_type(&self) -> StateType;

    fn counts(&self) -> Counts;

    /// Called under the transition lock once the variant becomes current.
    fn on_enter(&self, breaker: &Arc<Shared>, generation: u64);

    /// Called under the transition lock before the next variant is entered.
    /// Must clear counts and cancel any timer the variant started.
    fn on_leave(&self);
}

#[derive(Debug, Default)]
struct TallyInner {
    counts: Counts,
    live: Option<u64>,
}

/// Counts of one state variant, fenced by the generation they belong to.
///
/// Updates carry the generation the caller observed; an update whose
/// generation no longer matches the live one is discarded.
#[derive(Debug, Default)]
pub(crate) struct Tally {
    inner: Mutex<TallyInner>,
}

impl Tally {
    fn lock(&self) -> std::sync::MutexGuard<'_, TallyInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn snapshot(&self) -> Counts {
        self.lock().counts
    }

    /// Apply `f` if `generation` is still live, returning the updated counts.
    pub(crate) fn update(&self, generation: u64, f: impl FnOnce(&mut Counts)) -> Option<Counts> {
        let mut inner = self.lock();
        if inner.live != Some(generation) {
            return None;
        }
        f(&mut inner.counts);
        Some(inner.counts)
    }

    /// Start accepting updates for `generation` with fresh counts.
    pub(crate) fn activate(&self, generation: u64) {
        let mut inner = self.lock();
        inner.counts.clear();
        inner.live = Some(generation);
    }

    pub(crate) fn retire(&self) {
        let mut inner = self.lock();
        inner.counts.clear();
        inner.live = None;
    }
}

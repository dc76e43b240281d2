//! Workload simulation subsystem.
//!
//! # Data Flow
//! ```text
//! SimulationConfig
//!     → backend.rs (FlakyBackend: random failures + outage window)
//!     → runner.rs (N workers → CircuitBreaker::execute → tallies)
//!     → SimulationSummary (+ TransitionLog fed by on_state_change)
//! ```
//!
//! # Design Decisions
//! - Workers never retry a rejected call
//! - Time is read from tokio's clock so paused-time tests are deterministic

pub mod backend;
pub mod runner;

pub use backend::{BackendError, FlakyBackend};
pub use runner::{run_simulation, SimulationSummary, TransitionLog, TransitionRecord};

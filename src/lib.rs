//! In-process circuit breaker for async Rust.
//!
//! Wraps calls to a dependency, counts their outcomes, and stops calling the
//! dependency once a trip condition is met. After a timeout it lets probe
//! calls through and closes again once they succeed.
//!
//! ```rust,ignore
//! use circuit_breaker::{CircuitBreaker, Settings};
//! use std::time::Duration;
//!
//! let cb = CircuitBreaker::new(
//!     Settings::new("payments").open_timeout(Duration::from_secs(30)),
//! )?;
//! match cb.execute(|| client.charge(order)).await {
//!     Ok(receipt) => { /* ... */ }
//!     Err(e) if e.is_open() => { /* rejected, dependency not called */ }
//!     Err(e) => { /* the call itself failed */ }
//! }
//! ```

// Core
pub mod breaker;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

// Tooling
pub mod simulation;

pub use breaker::{
    BreakerError, CircuitBreaker, Counts, ExecuteError, Settings, StateReport, StateType,
};

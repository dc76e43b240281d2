//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT (Ctrl-C) → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → every subscribed simulation worker stops issuing calls
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;

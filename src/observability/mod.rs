//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! breaker transitions, rejections, panics
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, state gauge)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Prometheus scrape endpoint (simulator only)
//! ```

pub mod logging;
pub mod metrics;

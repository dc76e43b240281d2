//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (rates, probabilities, windows)
//! - Check addresses parse before anything binds them
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SimConfig → Result<(), Vec<ValidationError>>
//! - Breaker knobs need no checks: zero means "use the default"

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::SimConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("simulation.failure_rate must be within [0, 1], got {0}")]
    FailureRateOutOfRange(String),

    #[error("simulation.{0} must be greater than zero")]
    NotPositive(&'static str),

    #[error("outage window ({start}s + {len}s) exceeds run duration {duration}s")]
    OutageOutsideRun { start: u64, len: u64, duration: u64 },

    #[error("observability.log_level '{0}' is not one of trace, debug, info, warn, error")]
    UnknownLogLevel(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    BadMetricsAddress(String),
}

pub fn validate_config(config: &SimConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let sim = &config.simulation;

    if !(0.0..=1.0).contains(&sim.failure_rate) {
        errors.push(ValidationError::FailureRateOutOfRange(
            sim.failure_rate.to_string(),
        ));
    }
    if sim.duration_secs == 0 {
        errors.push(ValidationError::NotPositive("duration_secs"));
    }
    if sim.requests_per_sec == 0 {
        errors.push(ValidationError::NotPositive("requests_per_sec"));
    }
    if sim.concurrency == 0 {
        errors.push(ValidationError::NotPositive("concurrency"));
    }
    if sim.outage_secs > 0 && sim.outage_start_secs.saturating_add(sim.outage_secs) > sim.duration_secs
    {
        errors.push(ValidationError::OutageOutsideRun {
            start: sim.outage_start_secs,
            len: sim.outage_secs,
            duration: sim.duration_secs,
        });
    }

    let obs = &config.observability;
    if !LOG_LEVELS.contains(&obs.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::UnknownLogLevel(obs.log_level.clone()));
    }
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BadMetricsAddress(
            obs.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

//! Metrics collection and exposition.
//!
//! # Metrics
//! - `circuit_breaker_requests_total` (counter): calls by breaker, outcome
//! - `circuit_breaker_transitions_total` (counter): state changes by breaker, from, to
//! - `circuit_breaker_state` (gauge): 0=closed, 1=half-open, 2=open
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; a no-op until a recorder is installed
//! - The Prometheus exporter is only installed by the simulator binary

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::breaker::StateType;

/// How a call through the breaker ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
    Rejected,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
            Outcome::Rejected => "rejected",
        }
    }
}

/// Install the Prometheus exporter with an HTTP listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Prometheus exporter listening");
    Ok(())
}

pub fn record_request(breaker: &str, outcome: Outcome) {
    metrics::counter!(
        "circuit_breaker_requests_total",
        "breaker" => breaker.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

pub fn record_transition(breaker: &str, from: StateType, to: StateType) {
    metrics::counter!(
        "circuit_breaker_transitions_total",
        "breaker" => breaker.to_string(),
        "from" => from.as_str(),
        "to" => to.as_str()
    )
    .increment(1);
    set_state(breaker, to);
}

pub fn set_state(breaker: &str, state: StateType) {
    metrics::gauge!("circuit_breaker_state", "breaker" => breaker.to_string())
        .set(f64::from(state as u8));
}

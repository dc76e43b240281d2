//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files.
//! Durations are plain integers with their unit in the field name.

use serde::{Deserialize, Serialize};

/// Root configuration for the breaker simulator.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    /// Knobs of the breaker under test.
    pub breaker: BreakerConfig,

    /// Synthetic workload driven through the breaker.
    pub simulation: SimulationConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

/// Numeric breaker settings. Callbacks are attached in code.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct BreakerConfig {
    /// Breaker identifier for logs and metrics.
    pub name: String,

    /// Consecutive probe successes needed to close (0 = 1).
    pub max_half_open_requests: u32,

    /// Counts reset period while closed in milliseconds (0 = never).
    pub closed_reset_interval_ms: u64,

    /// Time spent open before probing in milliseconds (0 = 60s).
    pub open_timeout_ms: u64,
}

/// Synthetic workload settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Total run time in seconds.
    pub duration_secs: u64,

    /// Aggregate call rate across all workers.
    pub requests_per_sec: u32,

    /// Number of concurrent callers.
    pub concurrency: usize,

    /// Probability that a call fails outside the outage window.
    pub failure_rate: f64,

    /// Offset from start at which the dependency goes fully down.
    pub outage_start_secs: u64,

    /// Length of the outage (0 = no outage).
    pub outage_secs: u64,

    /// Simulated latency of every call in milliseconds.
    pub latency_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            duration_secs: 30,
            requests_per_sec: 50,
            concurrency: 4,
            failure_rate: 0.05,
            outage_start_secs: 5,
            outage_secs: 10,
            latency_ms: 20,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Prometheus endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

//! breaker-sim
//!
//! Drives a synthetic, failure-prone workload through one circuit breaker
//! and reports how it behaved.
//!
//! ```text
//!   workers ──▶ CircuitBreaker::execute ──▶ FlakyBackend
//!                     │                        (random failures,
//!                     │                         outage window)
//!                     ▼
//!           transitions → TransitionLog, tracing, metrics
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use circuit_breaker::config::{load_config, SimConfig};
use circuit_breaker::lifecycle::{signals, Shutdown};
use circuit_breaker::observability::{logging, metrics};
use circuit_breaker::simulation::{run_simulation, FlakyBackend, TransitionLog};
use circuit_breaker::{CircuitBreaker, Settings};

#[derive(Parser)]
#[command(name = "breaker-sim")]
#[command(about = "Simulate a flaky dependency behind a circuit breaker", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the summary as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Override simulation.failure_rate.
    #[arg(long)]
    failure_rate: Option<f64>,

    /// Override simulation.duration_secs.
    #[arg(long)]
    duration_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => SimConfig::default(),
    };
    if let Some(rate) = cli.failure_rate {
        config.simulation.failure_rate = rate;
    }
    if let Some(secs) = cli.duration_secs {
        config.simulation.duration_secs = secs;
    }
    circuit_breaker::config::validation::validate_config(&config)
        .map_err(circuit_breaker::config::ConfigError::Validation)?;

    logging::init_logging(&config.observability)?;
    tracing::info!(
        breaker = %config.breaker.name,
        open_timeout_ms = config.breaker.open_timeout_ms,
        closed_reset_interval_ms = config.breaker.closed_reset_interval_ms,
        failure_rate = config.simulation.failure_rate,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let log = TransitionLog::default();
    let breaker = CircuitBreaker::new(log.attach(Settings::from(&config.breaker)))?;
    let backend = Arc::new(FlakyBackend::new(&config.simulation));

    let shutdown = Shutdown::new();
    tokio::spawn(signals::wait_for_signal(shutdown.clone()));

    let summary = run_simulation(breaker, backend, &config.simulation, &log, &shutdown).await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "attempted={} succeeded={} failed={} rejected={}",
            summary.attempted, summary.succeeded, summary.failed, summary.rejected
        );
        for t in &summary.transitions {
            println!("  {:>8}ms  {} -> {}", t.at_ms, t.from, t.to);
        }
        let report = summary.final_report;
        println!(
            "final state={} generation={} counts={:?}",
            report.state, report.generation, report.counts
        );
    }

    Ok(())
}

//! Drives a synthetic workload through a breaker.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinSet;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::breaker::{CircuitBreaker, Settings, StateReport, StateType};
use crate::config::SimulationConfig;
use crate::lifecycle::Shutdown;
use crate::simulation::backend::FlakyBackend;

/// One observed state change, relative to the start of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransitionRecord {
    pub at_ms: u64,
    pub from: StateType,
    pub to: StateType,
}

/// Collects state changes through the breaker's notification hook.
#[derive(Debug, Clone, Default)]
pub struct TransitionLog {
    records: Arc<Mutex<Vec<TransitionRecord>>>,
}

impl TransitionLog {
    /// Install this log as `settings.on_state_change`.
    pub fn attach(&self, settings: Settings) -> Settings {
        let records = self.records.clone();
        let started = Instant::now();
        settings.on_state_change(move |_name, from, to| {
            records
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(TransitionRecord {
                    at_ms: started.elapsed().as_millis() as u64,
                    from,
                    to,
                });
        })
    }

    pub fn records(&self) -> Vec<TransitionRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[derive(Debug, Default)]
struct Tallies {
    attempted: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    rejected: AtomicU64,
}

/// Result of a simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationSummary {
    pub attempted: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub rejected: u64,
    pub transitions: Vec<TransitionRecord>,
    pub final_report: StateReport,
}

/// Run `config.concurrency` workers against `backend` until the configured
/// duration elapses or `shutdown` fires. Rejected calls are not retried.
pub async fn run_simulation(
    breaker: CircuitBreaker,
    backend: Arc<FlakyBackend>,
    config: &SimulationConfig,
    log: &TransitionLog,
    shutdown: &Shutdown,
) -> SimulationSummary {
    let tallies = Arc::new(Tallies::default());
    let workers = config.concurrency.max(1);
    let period = Duration::from_secs_f64(workers as f64 / f64::from(config.requests_per_sec.max(1)));
    let deadline = Instant::now() + Duration::from_secs(config.duration_secs);

    tracing::info!(
        breaker = %breaker.name(),
        workers,
        period_ms = period.as_millis() as u64,
        duration_secs = config.duration_secs,
        "Simulation starting"
    );

    let mut set = JoinSet::new();
    for worker in 0..workers {
        let breaker = breaker.clone();
        let backend = backend.clone();
        let tallies = tallies.clone();
        let mut stop = shutdown.subscribe();

        set.spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = time::sleep_until(deadline) => break,
                    _ = stop.recv() => break,
                }

                tallies.attempted.fetch_add(1, Ordering::Relaxed);
                match breaker.execute(|| backend.call()).await {
                    Ok(_) => tallies.succeeded.fetch_add(1, Ordering::Relaxed),
                    Err(e) => match e.into_inner() {
                        None => tallies.rejected.fetch_add(1, Ordering::Relaxed),
                        Some(err) => {
                            tracing::trace!(worker, error = %err, "Backend call failed");
                            tallies.failed.fetch_add(1, Ordering::Relaxed)
                        }
                    },
                };
            }
            tracing::debug!(worker, "Simulation worker stopped");
        });
    }

    while let Some(joined) = set.join_next().await {
        if let Err(e) = joined {
            tracing::error!(error = %e, "Simulation worker failed");
        }
    }

    let summary = SimulationSummary {
        attempted: tallies.attempted.load(Ordering::Relaxed),
        succeeded: tallies.succeeded.load(Ordering::Relaxed),
        failed: tallies.failed.load(Ordering::Relaxed),
        rejected: tallies.rejected.load(Ordering::Relaxed),
        transitions: log.records(),
        final_report: breaker.report(),
    };
    tracing::info!(
        attempted = summary.attempted,
        succeeded = summary.succeeded,
        failed = summary.failed,
        rejected = summary.rejected,
        transitions = summary.transitions.len(),
        "Simulation finished"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_outage_trips_breaker_and_rejects() {
        let config = SimulationConfig {
            duration_secs: 4,
            requests_per_sec: 20,
            concurrency: 2,
            failure_rate: 0.0,
            outage_start_secs: 1,
            outage_secs: 2,
            latency_ms: 0,
        };
        let log = TransitionLog::default();
        let settings = log.attach(Settings::new("sim").open_timeout(Duration::from_secs(10)));
        let breaker = CircuitBreaker::new(settings).unwrap();
        let backend = Arc::new(FlakyBackend::new(&config));

        let summary = run_simulation(breaker, backend, &config, &log, &Shutdown::new()).await;

        assert!(summary.attempted > 0);
        assert_eq!(
            summary.attempted,
            summary.succeeded + summary.failed + summary.rejected
        );
        assert!(summary.failed >= 6);
        assert!(summary.rejected > 0);
        assert_eq!(summary.transitions.len(), 1);
        assert_eq!(summary.transitions[0].from, StateType::Closed);
        assert_eq!(summary.transitions[0].to, StateType::Open);
        assert_eq!(summary.final_report.state, StateType::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_workers() {
        let config = SimulationConfig {
            duration_secs: 3600,
            latency_ms: 0,
            outage_secs: 0,
            failure_rate: 0.0,
            ..Default::default()
        };
        let log = TransitionLog::default();
        let breaker = CircuitBreaker::new(log.attach(Settings::new("sim"))).unwrap();
        let backend = Arc::new(FlakyBackend::new(&config));
        let shutdown = Shutdown::new();

        let trigger = shutdown.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_secs(1)).await;
            trigger.trigger();
        });

        let summary = run_simulation(breaker, backend, &config, &log, &shutdown).await;
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.rejected, 0);
        assert!(summary.succeeded > 0);
        assert!(summary.transitions.is_empty());
    }
}

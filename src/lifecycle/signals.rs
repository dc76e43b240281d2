//! OS signal handling.

use crate::lifecycle::Shutdown;

/// Trigger `shutdown` on the first Ctrl-C.
///
/// Returns immediately if the signal handler cannot be installed; the run
/// then ends only when its configured duration elapses.
pub async fn wait_for_signal(shutdown: Shutdown) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!(
                workers = shutdown.receiver_count(),
                "Interrupt received, stopping simulation"
            );
            shutdown.trigger();
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
        }
    }
}

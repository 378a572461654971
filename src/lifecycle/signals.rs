//! OS signal handling.
//!
//! # Responsibilities
//! - Register handlers for SIGTERM and SIGINT (Ctrl+C elsewhere)
//! - Translate the first one into a shutdown notification
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Publishing goes through a watch channel, so the handler never blocks
//! - Later signals are not observed; one reaction per process

use std::io;

use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::Shutdown;

/// Wait for SIGTERM or SIGINT and return the name of the one received.
#[cfg(unix)]
pub async fn wait_for_signal() -> io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(name)
}

/// Wait for Ctrl+C.
#[cfg(not(unix))]
pub async fn wait_for_signal() -> io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("CTRL_C")
}

/// Spawn the signal watcher. It triggers `shutdown` on the first termination signal.
///
/// If handlers cannot be registered the error is logged and returned from the
/// task; the service keeps running and can still stop on a serve error.
pub fn spawn_signal_watcher(shutdown: Shutdown) -> JoinHandle<io::Result<()>> {
    tokio::spawn(async move {
        match wait_for_signal().await {
            Ok(signal) => {
                tracing::info!(signal, "Termination signal received");
                shutdown.trigger();
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to register signal handlers");
                Err(e)
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn watcher_waits_for_a_signal() {
        let shutdown = Shutdown::new();
        let watcher = spawn_signal_watcher(shutdown.clone());

        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(!watcher.is_finished());
        assert!(!shutdown.is_triggered());
        watcher.abort();
    }
}

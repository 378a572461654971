//! Shutdown coordinator.
//!
//! # States
//! ```text
//! Starting ──▶ Running ──(serve error | shutdown signal, first wins)──▶ Draining ──▶ Terminated
//! ```
//!
//! `Running` is entered when `run` is handed the started listeners.
//!
//! Draining stops the API listener within the shutdown deadline (forcing it
//! closed when the deadline elapses), then releases the database. The
//! database is never closed while the listener may still be serving.

use std::fmt;
use std::time::Duration;

use tokio::sync::{oneshot, watch};

use crate::database::{DatabaseGuard, DatabaseHandle};
use crate::error::Error;
use crate::http::ServeError;
use crate::lifecycle::drain::{drain, DrainOutcome, ListenerHandle};
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::observability::metrics;

/// Lifecycle phase of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Starting,
    Running,
    Draining,
    Terminated,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Starting => "starting",
            Phase::Running => "running",
            Phase::Draining => "draining",
            Phase::Terminated => "terminated",
        }
    }

    fn as_gauge(&self) -> f64 {
        match self {
            Phase::Starting => 0.0,
            Phase::Running => 1.0,
            Phase::Draining => 2.0,
            Phase::Terminated => 3.0,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What ended the serving phase.
#[derive(Debug)]
pub enum TerminalEvent {
    ServeError(ServeError),
    ShutdownSignal,
}

/// How a run ended. Exactly one per run.
#[derive(Debug)]
pub enum Outcome {
    CleanShutdown,
    ForcedShutdown { deadline: Duration },
    FatalServeError(ServeError),
}

impl Outcome {
    /// `Ok` only for a clean shutdown.
    pub fn into_result(self) -> Result<(), Error> {
        match self {
            Outcome::CleanShutdown => Ok(()),
            Outcome::ForcedShutdown { deadline } => Err(Error::ShutdownTimeout { deadline }),
            Outcome::FatalServeError(e) => Err(Error::Serve(e)),
        }
    }
}

/// Arbitrates between serving, failing and draining.
#[derive(Debug)]
pub struct Coordinator {
    deadline: Duration,
    phase: watch::Sender<Phase>,
}

impl Coordinator {
    /// A coordinator in the `Starting` phase.
    pub fn new(deadline: Duration) -> Self {
        let (phase, _) = watch::channel(Phase::Starting);
        metrics::record_phase(Phase::Starting.as_gauge());
        Self { deadline, phase }
    }

    /// Observe phase changes.
    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    /// Block until a terminal event, drain `listener`, release `database`.
    ///
    /// `serve_result` is the primary listener's result channel; `Ok(())` is
    /// the listener reporting it was closed, anything else is fatal.
    pub async fn run<L, D>(
        self,
        listener: &L,
        serve_result: oneshot::Receiver<Result<(), ServeError>>,
        mut shutdown: ShutdownSignal,
        database: DatabaseGuard<D>,
    ) -> Outcome
    where
        L: ListenerHandle + ?Sized,
        D: DatabaseHandle,
    {
        self.enter(Phase::Running);

        let event = tokio::select! {
            result = serve_result => match result {
                Ok(Err(e)) => TerminalEvent::ServeError(e),
                Ok(Ok(())) => {
                    tracing::info!("API listener closed");
                    TerminalEvent::ShutdownSignal
                }
                Err(_) => TerminalEvent::ServeError(ServeError::Aborted),
            },
            _ = shutdown.wait() => TerminalEvent::ShutdownSignal,
        };

        match &event {
            TerminalEvent::ServeError(e) => {
                tracing::error!(error = %e, "API listener failed, shutting down");
            }
            TerminalEvent::ShutdownSignal => tracing::info!("Start shutdown"),
        }
        self.enter(Phase::Draining);

        let report = drain(listener, self.deadline).await;
        database.release().await;

        let outcome = match (event, report.outcome) {
            (TerminalEvent::ServeError(e), _) => Outcome::FatalServeError(e),
            (TerminalEvent::ShutdownSignal, DrainOutcome::Graceful) => Outcome::CleanShutdown,
            (TerminalEvent::ShutdownSignal, DrainOutcome::Forced) => Outcome::ForcedShutdown {
                deadline: self.deadline,
            },
        };
        self.enter(Phase::Terminated);

        match &outcome {
            Outcome::CleanShutdown => {
                tracing::info!(elapsed = ?report.elapsed, "Shutdown complete");
            }
            Outcome::ForcedShutdown { deadline } => {
                tracing::warn!(deadline = ?deadline, "Shutdown forced after deadline");
            }
            Outcome::FatalServeError(e) => {
                tracing::error!(
                    error = %e,
                    forced = report.outcome == DrainOutcome::Forced,
                    "Shutdown after fatal serve error"
                );
            }
        }
        outcome
    }

    fn enter(&self, phase: Phase) {
        let from = self.phase.send_replace(phase);
        metrics::record_phase(phase.as_gauge());
        tracing::debug!(%from, to = %phase, "Lifecycle transition");
    }
}

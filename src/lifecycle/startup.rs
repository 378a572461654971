//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the database and wrap it in its release guard
//! - Start the diagnostics listener (best effort) and the API listener
//! - Hand everything to the coordinator and wait for the final outcome
//!
//! # Design Decisions
//! - Fail fast: a startup error is fatal and nothing is retried
//! - Steps run in order, not concurrently; listeners start last
//! - The database is released on every path, including failed startup

use std::time::Duration;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::{render_config, ServiceConfig};
use crate::database::{Database, DatabaseGuard, DatabaseHandle};
use crate::diagnostics::{self, DiagnosticsState};
use crate::error::Error;
use crate::http::{build_router, ApiServer};
use crate::lifecycle::coordinator::Coordinator;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::spawn_signal_watcher;
use crate::net::{ConnectionTracker, Listener};

const DIAGNOSTICS_STOP_GRACE: Duration = Duration::from_secs(1);

/// Run the service until it is told to stop or its API listener fails.
pub async fn run(config: &ServiceConfig, metrics: PrometheusHandle) -> Result<(), Error> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Service started");

    let result = async {
        let rendered = render_config(config)?;
        tracing::info!("Config:\n{rendered}");

        let database = DatabaseGuard::new(Database::open(&config.db)?);

        let shutdown = Shutdown::new();
        let signals = spawn_signal_watcher(shutdown.clone());
        let result = serve(config, database, &shutdown, metrics).await;
        signals.abort();
        result
    }
    .await;

    tracing::info!("Service completed");
    result
}

/// Start both listeners and supervise them until shutdown.
///
/// `shutdown` is the termination request source; triggering it is what a
/// SIGTERM does in production.
pub async fn serve<D: DatabaseHandle>(
    config: &ServiceConfig,
    database: DatabaseGuard<D>,
    shutdown: &Shutdown,
    metrics: PrometheusHandle,
) -> Result<(), Error> {
    let coordinator = Coordinator::new(config.web.shutdown_timeout);
    let connections = ConnectionTracker::new();

    let mut diagnostics = diagnostics::spawn(
        config.web.debug.clone(),
        DiagnosticsState::new(coordinator.subscribe(), connections.clone(), metrics),
    );

    let router = build_router(database.handle(), config.web.write_timeout);

    let listener = match Listener::bind(&config.web.address).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, "API listener failed to start");
            diagnostics.abort();
            database.release().await;
            return Err(e.into());
        }
    };
    tracing::info!(address = %listener.local_addr(), "API listening");

    let (server, serve_result) =
        ApiServer::new(router, config.web.read_timeout, connections).start(listener);

    let outcome = coordinator
        .run(&server, serve_result, shutdown.subscribe(), database)
        .await;

    // Diagnostics wind down on their own once the coordinator is terminated.
    if tokio::time::timeout(DIAGNOSTICS_STOP_GRACE, &mut diagnostics)
        .await
        .is_err()
    {
        diagnostics.abort();
    }
    outcome.into_result()
}

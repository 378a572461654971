//! Diagnostics listener.
//!
//! Runs next to the API on its own address and never influences the API's
//! lifecycle: failing to bind or serve is logged and otherwise ignored. It
//! shuts down with its open connections once the coordinator reaches
//! `Terminated` (or goes away).
//!
//! - `/debug/health` - Liveness
//! - `/debug/ready` - Readiness (coordinator still running)
//! - `/debug/vars` - Version, phase, uptime, open API connections
//! - `/debug/metrics` - Prometheus metrics in text format

pub mod handlers;

use std::time::Instant;

use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::lifecycle::Phase;
use crate::net::{ConnectionTracker, Listener};
use self::handlers::*;

/// State shared by the diagnostics handlers.
#[derive(Clone)]
pub struct DiagnosticsState {
    phase: watch::Receiver<Phase>,
    connections: ConnectionTracker,
    metrics: PrometheusHandle,
    started: Instant,
}

impl DiagnosticsState {
    pub fn new(
        phase: watch::Receiver<Phase>,
        connections: ConnectionTracker,
        metrics: PrometheusHandle,
    ) -> Self {
        Self {
            phase,
            connections,
            metrics,
            started: Instant::now(),
        }
    }
}

pub fn build_router(state: DiagnosticsState) -> Router {
    Router::new()
        .route("/debug/health", get(get_health))
        .route("/debug/ready", get(get_ready))
        .route("/debug/vars", get(get_vars))
        .route("/debug/metrics", get(get_metrics))
        .with_state(state)
}

/// Start the diagnostics listener in the background.
pub fn spawn(address: String, state: DiagnosticsState) -> JoinHandle<()> {
    let mut phase = state.phase.clone();
    let terminated = async move {
        let _ = phase.wait_for(|p| *p == Phase::Terminated).await;
    };

    tokio::spawn(async move {
        let listener = match Listener::bind(&address).await {
            Ok(listener) => listener,
            Err(e) => {
                tracing::warn!(error = %e, "Diagnostics listener unavailable");
                return;
            }
        };
        tracing::info!(address = %listener.local_addr(), "Diagnostics listening");

        match axum::serve(listener.into_inner(), build_router(state))
            .with_graceful_shutdown(terminated)
            .await
        {
            Ok(()) => tracing::info!("Diagnostics listener stopped"),
            Err(e) => tracing::warn!(error = %e, "Diagnostics listener ended"),
        }
    })
}

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use crate::diagnostics::DiagnosticsState;
use crate::lifecycle::Phase;

#[derive(Debug, Serialize)]
pub struct ServiceVars {
    pub version: &'static str,
    pub phase: &'static str,
    pub uptime_secs: u64,
    pub active_connections: usize,
}

/// Liveness: answering at all is the signal.
pub async fn get_health() -> StatusCode {
    StatusCode::OK
}

/// Readiness: only while the coordinator is still serving.
pub async fn get_ready(State(state): State<DiagnosticsState>) -> StatusCode {
    if *state.phase.borrow() == Phase::Running {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

pub async fn get_vars(State(state): State<DiagnosticsState>) -> Json<ServiceVars> {
    let phase = *state.phase.borrow();
    Json(ServiceVars {
        version: env!("CARGO_PKG_VERSION"),
        phase: phase.as_str(),
        uptime_secs: state.started.elapsed().as_secs(),
        active_connections: state.connections.active_count(),
    })
}

pub async fn get_metrics(State(state): State<DiagnosticsState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        state.metrics.render(),
    )
}

//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define service metrics (requests, latency, connections, lifecycle phase)
//! - Install the Prometheus recorder whose handle the diagnostics listener renders
//!
//! # Metrics
//! - `http_requests_total` (counter): API requests by method, status
//! - `http_request_duration_seconds` (histogram): API latency distribution
//! - `http_active_connections` (gauge): current API connection count
//! - `lifecycle_phase` (gauge): 0=starting, 1=running, 2=draining, 3=terminated
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op, which keeps tests independent
//! - Histogram buckets tuned for typical web latencies

use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

fn builder() -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full("http_request_duration_seconds".to_string()),
        LATENCY_BUCKETS,
    )
}

/// Install the process-wide recorder. Call once, from `main`.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    builder()?.install_recorder()
}

/// A recorder that is not installed globally, for rendering in tests.
pub fn detached_handle() -> Result<PrometheusHandle, BuildError> {
    Ok(builder()?.build_recorder().handle())
}

/// Record one completed API request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!("http_requests_total", &labels).increment(1);
    metrics::histogram!("http_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

pub fn connection_opened() {
    metrics::gauge!("http_active_connections").increment(1.0);
}

pub fn connection_closed() {
    metrics::gauge!("http_active_connections").decrement(1.0);
}

/// Record the coordinator's phase as a number.
pub fn record_phase(value: f64) {
    metrics::gauge!("lifecycle_phase").set(value);
}

//! Request identification and accounting.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) unless the client sent one
//! - Record request count and latency
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Metrics wrap the write timeout, so timed-out requests count as 408

use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tower_http::request_id::{MakeRequestId, RequestId};

use crate::observability::metrics;

/// Header carrying the request ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestUuid;

impl MakeRequestId for RequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Middleware recording `http_requests_total` and `http_request_duration_seconds`.
pub async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();

    let response = next.run(request).await;

    metrics::record_request(method.as_str(), response.status().as_u16(), start);
    response
}

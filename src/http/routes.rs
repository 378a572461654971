//! API route table.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::database::DatabaseHandle;
use crate::http::request::{track_metrics, RequestUuid, X_REQUEST_ID};

/// Build the API router. `write_timeout` bounds how long a handler may take
/// to produce its response.
pub fn build_router<D: DatabaseHandle>(db: Arc<D>, write_timeout: Duration) -> Router {
    Router::new()
        .route("/v1/health", get(health::<D>))
        .fallback(not_found)
        .with_state(db)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            write_timeout,
        ))
        .layer(middleware::from_fn(track_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
        .layer(SetRequestIdLayer::new(X_REQUEST_ID, RequestUuid))
}

/// Readiness of the API: the database must answer.
async fn health<D: DatabaseHandle>(State(db): State<Arc<D>>) -> impl IntoResponse {
    match db.ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "db not ready" })),
            )
        }
    }
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseError;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use tower::ServiceExt;

    struct StubDb {
        healthy: bool,
        delay: Duration,
    }

    #[async_trait]
    impl DatabaseHandle for StubDb {
        async fn ping(&self) -> Result<(), DatabaseError> {
            tokio::time::sleep(self.delay).await;
            if self.healthy {
                Ok(())
            } else {
                Err(DatabaseError::Connect(sqlx::Error::PoolTimedOut))
            }
        }

        async fn close(&self) {}
    }

    fn router(healthy: bool, delay: Duration, write_timeout: Duration) -> Router {
        build_router(Arc::new(StubDb { healthy, delay }), write_timeout)
    }

    fn get(path: &str) -> Request<Body> {
        Request::builder().uri(path).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_ok_when_database_answers() {
        let response = router(true, Duration::ZERO, Duration::from_secs(5))
            .oneshot(get("/v1/health"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(X_REQUEST_ID));
    }

    #[tokio::test]
    async fn health_500_when_database_is_down() {
        let response = router(false, Duration::ZERO, Duration::from_secs(5))
            .oneshot(get("/v1/health"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn client_request_id_is_propagated() {
        let request = Request::builder()
            .uri("/v1/health")
            .header(X_REQUEST_ID, "abc-123")
            .body(Body::empty())
            .unwrap();

        let response = router(true, Duration::ZERO, Duration::from_secs(5))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.headers()[X_REQUEST_ID], "abc-123");
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let response = router(true, Duration::ZERO, Duration::from_secs(5))
            .oneshot(get("/v1/products"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_handler_hits_write_timeout() {
        let response = router(true, Duration::from_secs(10), Duration::from_secs(1))
            .oneshot(get("/v1/health"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_requests_are_counted() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let _guard = metrics::set_default_local_recorder(&recorder);

        let response = router(true, Duration::from_secs(10), Duration::from_secs(1))
            .oneshot(get("/v1/health"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);

        let rendered = handle.render();
        assert!(
            rendered
                .lines()
                .any(|line| line.starts_with("http_requests_total") && line.contains(r#"status="408""#)),
            "408 missing from:\n{rendered}"
        );
    }
}

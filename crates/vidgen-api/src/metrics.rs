//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
///
/// Returns a handle used to render the /metrics endpoint.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// Metric names as constants for consistency.
pub mod names {
    pub const HTTP_REQUESTS_TOTAL: &str = "vidgen_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "vidgen_http_request_duration_seconds";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Middleware recording per-request counters and latency.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );

    response
}

/// Sanitize path for metrics labels: job IDs would explode cardinality.
fn sanitize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            let id_like = segment.len() >= 8
                && segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
                && segment.chars().any(|c| c.is_ascii_digit());
            if id_like {
                ":id"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path_replaces_ids() {
        assert_eq!(
            sanitize_path("/api/generations/a1b2c3d4-e5f6-7890"),
            "/api/generations/:id"
        );
        assert_eq!(sanitize_path("/api/generations"), "/api/generations");
        assert_eq!(sanitize_path("/health"), "/health");
    }
}

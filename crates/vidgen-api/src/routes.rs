//! API routes.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{get_generation, health, list_generations, ready, submit_generation};
use crate::metrics::metrics_middleware;
use crate::middleware::cors_layer;
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let generation_routes = Router::new()
        .route("/generations", post(submit_generation))
        .route("/generations", get(list_generations))
        .route("/generations/:job_id", get(get_generation));

    let mut router = Router::new()
        .nest("/api", generation_routes)
        .route("/health", get(health))
        .route("/ready", get(ready));

    if let Some(handle) = metrics_handle {
        router = router.route("/metrics", get(move || async move { handle.render() }));
    }

    router
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .with_state(state)
}

//! Axum HTTP API server.
//!
//! This crate provides:
//! - Submission and status endpoints for generation jobs
//! - Bearer-token authentication
//! - Prometheus metrics
//! - The process bootstrap that owns executor client lifecycle

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod media_catalog;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;

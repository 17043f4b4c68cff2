//! ClaimTrack HTTP API
//!
//! Wraps the `claims-service` importers, store and dashboard in an axum router:
//! multipart uploads, claim listing and detail, flags and notes, and the
//! dashboard report.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod types;

use axum::{extract::DefaultBodyLimit, middleware::from_fn, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiErrorResponse, ApiResponse, ApiResult};
pub use server::AppState;

/// Create the application router with middleware
pub fn create_app(state: AppState) -> Router {
    let body_limit = state.config.server.max_upload_bytes;

    routes::create_routes()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::create_cors_layer())
                .layer(from_fn(middleware::request_timing_middleware))
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

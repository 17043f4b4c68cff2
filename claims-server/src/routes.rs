use crate::{
    handlers::{annotations, claims, dashboard, health, uploads},
    server::AppState,
};
use axum::{
    routing::{get, post},
    Router,
};

/// Create health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health::health_check))
}

/// Create upload routes
pub fn upload_routes() -> Router<AppState> {
    Router::new().route("/uploads", post(uploads::upload_files))
}

/// Create claim routes, including flags and notes on a claim
pub fn claim_routes() -> Router<AppState> {
    Router::new()
        .route("/claims", get(claims::list_claims))
        .route("/claims/:id", get(claims::get_claim))
        .route("/claims/:id/flags", post(annotations::create_flag))
        .route("/claims/:id/notes", post(annotations::create_note))
        .route("/flags/:id/resolve", post(annotations::resolve_flag))
}

/// Create dashboard routes
pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/dashboard", get(dashboard::get_dashboard))
}

/// Create all application routes
pub fn create_routes() -> Router<AppState> {
    Router::new().merge(health_routes()).nest(
        "/api/v1",
        Router::new()
            .merge(upload_routes())
            .merge(claim_routes())
            .merge(dashboard_routes()),
    )
}

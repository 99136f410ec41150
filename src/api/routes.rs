//! Route definitions for the API.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;
use super::SharedState;

/// Create the main API router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api/v1/artifacts/resolve", get(handlers::resolve::resolve))
        .route(
            "/api/v1/artifacts/recent",
            get(handlers::records::list_recent),
        )
        .route("/api/v1/alerts/state", get(handlers::alerts::alert_state))
        .route("/api/v1/events/build", post(handlers::events::build_event))
        .with_state(state)
}

//! Route definitions for the checkout HTTP API.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root::hello))
        .merge(checkout_routes())
        .merge(health_routes())
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Reservation endpoints: acquire, status
fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(handlers::checkout::create_checkout))
        .route("/checkout/{id}", get(handlers::checkout::get_checkout))
}

/// Store reachability
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}

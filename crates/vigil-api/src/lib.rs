//! vigil-api — REST API for Vigil.
//!
//! Provides axum route handlers for registering, inspecting, removing, and
//! ad-hoc probing of health check targets.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/api/health/checks?page=N` | List targets, 10 per page, sorted by endpoint |
//! | POST | `/api/health/checks` | Register an endpoint |
//! | GET | `/api/health/checks/{id}` | Get a target and its last result |
//! | DELETE | `/api/health/checks/{id}` | Remove a target |
//! | POST | `/api/health/checks/{id}/try?timeout=2s` | Probe a target once, without recording the result |
//!
//! Every error response has the body `{"error": "<message>"}`.

pub mod handlers;
pub mod models;

use axum::Router;
use axum::routing::{get, post};
use vigil_health::Prober;
use vigil_registry::Registry;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub registry: Registry,
    /// Used by the try route; its default timeout applies when the request
    /// does not give one.
    pub prober: Prober,
}

/// Build the API router.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route(
            "/api/health/checks",
            get(handlers::list_targets).post(handlers::create_target),
        )
        .route(
            "/api/health/checks/{id}",
            get(handlers::get_target).delete(handlers::delete_target),
        )
        .route("/api/health/checks/{id}/try", post(handlers::try_target))
        .with_state(state)
}

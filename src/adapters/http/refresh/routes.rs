//! Axum router configuration for refresh endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{health, method_not_allowed, trigger_refresh, RefreshAppState};

/// Create the refresh API router.
///
/// # Routes
///
/// - `POST /api/refresh` - Run one refresh pass (other methods answer 405)
/// - `GET /health` - Liveness and circuit breaker snapshot
pub fn refresh_routes() -> Router<RefreshAppState> {
    Router::new()
        .route(
            "/api/refresh",
            post(trigger_refresh).fallback(method_not_allowed),
        )
        .route("/health", get(health))
}

/// Create the complete refresh module router.
pub fn refresh_router() -> Router<RefreshAppState> {
    refresh_routes()
}

//! HTTP adapters - REST API implementations.

pub mod middleware;
pub mod refresh;

use std::time::Duration;

use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use refresh::{refresh_router, RefreshAppState};

/// Builds the application router with tracing and a request timeout.
///
/// Timeouts answer with the standard error envelope.
pub fn app_router(state: RefreshAppState, request_timeout: Duration) -> Router {
    refresh_router()
        .layer(TimeoutLayer::new(request_timeout))
        .layer(axum::middleware::from_fn(middleware::timeout_envelope))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

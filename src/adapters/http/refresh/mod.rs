//! Refresh HTTP adapter - trigger endpoint for scheduled refresh runs.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;

pub use handlers::{correlation_from_headers, RefreshApiError, RefreshAppState, RequestCorrelation};
pub use routes::refresh_router;

//! HTTP handlers for the refresh trigger and health endpoints.
//!
//! These handlers connect Axum routes to the refresh run handler.

use std::convert::Infallible;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::application::{RefreshProductsCommand, RefreshProductsHandler};
use crate::domain::foundation::{CorrelationId, DomainError, ErrorCode, ErrorKind};
use crate::ports::CircuitBreaker;

use super::dto::{
    CircuitBreakerResponse, ErrorEnvelope, HealthResponse, RefreshResponse, CORRELATION_ID_HEADER,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for the refresh endpoints.
///
/// The worker is optional: a process started without a database still serves
/// `/health`, and triggers answer with `CONFIGURATION_ERROR`.
#[derive(Clone)]
pub struct RefreshAppState {
    worker: Result<Arc<RefreshProductsHandler>, String>,
    breaker: Arc<dyn CircuitBreaker>,
}

impl RefreshAppState {
    pub fn new(handler: Arc<RefreshProductsHandler>, breaker: Arc<dyn CircuitBreaker>) -> Self {
        Self {
            worker: Ok(handler),
            breaker,
        }
    }

    /// State for a process whose worker could not be wired.
    pub fn unconfigured(reason: impl Into<String>, breaker: Arc<dyn CircuitBreaker>) -> Self {
        Self {
            worker: Err(reason.into()),
            breaker,
        }
    }

    fn worker(&self) -> Result<Arc<RefreshProductsHandler>, DomainError> {
        self.worker
            .clone()
            .map_err(|reason| DomainError::new(ErrorCode::ConfigurationError, reason))
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Correlation Id Extraction
// ════════════════════════════════════════════════════════════════════════════════

/// Correlation id from `x-correlation-id` when it is a UUID, otherwise new.
#[derive(Debug, Clone, Copy)]
pub struct RequestCorrelation(pub CorrelationId);

#[async_trait]
impl<S> FromRequestParts<S> for RequestCorrelation
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(correlation_from_headers(&parts.headers).unwrap_or_default()))
    }
}

/// Correlation id carried by `x-correlation-id`, if it parses as a UUID.
pub fn correlation_from_headers(headers: &HeaderMap) -> Option<CorrelationId> {
    headers
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<CorrelationId>().ok())
}

fn correlation_header(id: CorrelationId) -> [(HeaderName, String); 1] {
    [(HeaderName::from_static(CORRELATION_ID_HEADER), id.to_string())]
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/refresh - Run one refresh pass
///
/// The run is spawned so a dropped client connection cannot cancel it
/// halfway through a product.
pub async fn trigger_refresh(
    State(state): State<RefreshAppState>,
    RequestCorrelation(correlation_id): RequestCorrelation,
) -> Result<impl IntoResponse, RefreshApiError> {
    let fail = |error: DomainError| RefreshApiError::new(error, correlation_id);

    let handler = state.worker().map_err(fail)?;
    tracing::info!(%correlation_id, "Refresh triggered");

    let cmd = RefreshProductsCommand::new(correlation_id);
    let result = tokio::spawn(async move { handler.handle(cmd).await })
        .await
        .map_err(|e| {
            tracing::error!(%correlation_id, error = %e, "Refresh task aborted");
            fail(DomainError::new(ErrorCode::InternalError, "Refresh task aborted"))
        })?
        .map_err(fail)?;

    Ok((
        StatusCode::OK,
        correlation_header(correlation_id),
        Json(RefreshResponse::from(&result)),
    ))
}

/// Any method other than POST on /api/refresh
pub async fn method_not_allowed(
    RequestCorrelation(correlation_id): RequestCorrelation,
) -> RefreshApiError {
    RefreshApiError::new(
        DomainError::new(ErrorCode::MethodNotAllowed, "Only POST is supported"),
        correlation_id,
    )
}

/// GET /health - Liveness plus breaker snapshot
pub async fn health(State(state): State<RefreshAppState>) -> impl IntoResponse {
    let (configured, running) = match &state.worker {
        Ok(handler) => (true, handler.is_running()),
        Err(_) => (false, false),
    };
    Json(HealthResponse {
        status: "ok".to_string(),
        refresh_configured: configured,
        refresh_running: running,
        circuit_breaker: CircuitBreakerResponse::from(state.breaker.metrics()),
    })
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts domain errors to the error envelope.
#[derive(Debug)]
pub struct RefreshApiError {
    error: DomainError,
    correlation_id: CorrelationId,
}

impl RefreshApiError {
    pub fn new(error: DomainError, correlation_id: CorrelationId) -> Self {
        Self {
            error,
            correlation_id,
        }
    }

    fn status(&self) -> StatusCode {
        match (self.error.code, self.error.kind()) {
            (ErrorCode::MethodNotAllowed, _) => StatusCode::METHOD_NOT_ALLOWED,
            (ErrorCode::RefreshInProgress, _) => StatusCode::CONFLICT,
            (ErrorCode::RequestTimeout, _) => StatusCode::REQUEST_TIMEOUT,
            (_, ErrorKind::Validation) => StatusCode::BAD_REQUEST,
            (_, ErrorKind::UpstreamItem | ErrorKind::UpstreamTransient) => StatusCode::BAD_GATEWAY,
            (_, ErrorKind::CircuitOpen) => StatusCode::SERVICE_UNAVAILABLE,
            (_, ErrorKind::Store | ErrorKind::Configuration | ErrorKind::Internal) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for RefreshApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(
                correlation_id = %self.correlation_id,
                error_code = %self.error.code,
                error = %self.error.message,
                "Refresh request failed"
            );
        }
        let body = ErrorEnvelope::new(&self.error, self.correlation_id);
        (status, correlation_header(self.correlation_id), Json(body)).into_response()
    }
}

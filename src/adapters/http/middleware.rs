//! Router-wide middleware.

use axum::extract::Request;
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::domain::foundation::{CorrelationId, DomainError, ErrorCode};

use super::refresh::{correlation_from_headers, RefreshApiError, CORRELATION_ID_HEADER};

/// Pins a correlation id on the request and turns a bare timeout response
/// from the inner timeout layer into the error envelope.
///
/// A refresh run already started keeps going on its own task; only the
/// response is given up.
pub async fn timeout_envelope(mut request: Request, next: Next) -> Response {
    let correlation_id = match correlation_from_headers(request.headers()) {
        Some(id) => id,
        None => {
            let id = CorrelationId::new();
            if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
                request.headers_mut().insert(CORRELATION_ID_HEADER, value);
            }
            id
        }
    };

    let response = next.run(request).await;
    if response.status() != StatusCode::REQUEST_TIMEOUT {
        return response;
    }

    tracing::warn!(%correlation_id, "Request timed out before the refresh run finished");
    RefreshApiError::new(
        DomainError::new(
            ErrorCode::RequestTimeout,
            "Request timed out; the refresh run continues in the background",
        ),
        correlation_id,
    )
    .into_response()
}

//! HTTP DTOs for the refresh trigger and health endpoints.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::application::RefreshProductsResult;
use crate::domain::foundation::{CorrelationId, DomainError};
use crate::domain::refresh::RunMetrics;
use crate::ports::CircuitBreakerMetrics;

/// Header carrying the run correlation id, in and out.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Counters reported to the trigger caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsResponse {
    pub processed: u32,
    pub success: u32,
    pub failure: u32,
    pub skipped: u32,
    pub duration_ms: u64,
}

impl From<&RunMetrics> for MetricsResponse {
    fn from(metrics: &RunMetrics) -> Self {
        Self {
            processed: metrics.processed,
            success: metrics.success,
            failure: metrics.failure,
            skipped: metrics.skipped,
            duration_ms: metrics.duration_ms,
        }
    }
}

/// Body of a successful `POST /api/refresh`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub metrics: MetricsResponse,
    pub message: String,
    pub correlation_id: String,
}

impl From<&RefreshProductsResult> for RefreshResponse {
    fn from(result: &RefreshProductsResult) -> Self {
        Self {
            success: true,
            metrics: MetricsResponse::from(&result.metrics),
            message: result.message(),
            correlation_id: result.correlation_id.to_string(),
        }
    }
}

/// Snapshot of the upstream circuit breaker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerResponse {
    pub state: String,
    pub current_failures: u32,
    pub current_successes: u32,
    pub total_requests: u64,
    pub total_successes: u64,
    pub total_failures: u64,
    pub rejected_requests: u64,
    pub times_opened: u64,
    pub times_closed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_until_half_open_ms: Option<u64>,
}

impl From<CircuitBreakerMetrics> for CircuitBreakerResponse {
    fn from(m: CircuitBreakerMetrics) -> Self {
        Self {
            state: m.state.to_string(),
            current_failures: m.current_failures,
            current_successes: m.current_successes,
            total_requests: m.total_requests,
            total_successes: m.total_successes,
            total_failures: m.total_failures,
            rejected_requests: m.rejected_requests,
            times_opened: m.times_opened,
            times_closed: m.times_closed,
            time_until_half_open_ms: m.time_until_half_open.map(|d| d.as_millis() as u64),
        }
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// False when the worker could not be wired (for example no database).
    pub refresh_configured: bool,
    pub refresh_running: bool,
    pub circuit_breaker: CircuitBreakerResponse,
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Envelope
// ════════════════════════════════════════════════════════════════════════════════

/// Error detail inside the envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: HashMap<String, String>,
}

/// Body of every failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: ErrorBody,
    pub correlation_id: String,
}

impl ErrorEnvelope {
    pub fn new(error: &DomainError, correlation_id: CorrelationId) -> Self {
        Self {
            success: false,
            error: ErrorBody {
                code: error.code.to_string(),
                message: error.message.clone(),
                details: error.details.clone(),
            },
            correlation_id: correlation_id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCode;
    use crate::domain::refresh::ProductOutcome;

    #[test]
    fn refresh_response_serializes_expected_shape() {
        let mut metrics = RunMetrics::default();
        metrics.record(ProductOutcome::Success);
        metrics.record(ProductOutcome::Skipped);
        metrics.defer(3);
        metrics.duration_ms = 42;
        let result = RefreshProductsResult {
            correlation_id: CorrelationId::new(),
            metrics,
        };

        let json = serde_json::to_value(RefreshResponse::from(&result)).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Processed 2 products");
        assert_eq!(json["metrics"]["processed"], 2);
        assert_eq!(json["metrics"]["skipped"], 1);
        assert_eq!(json["metrics"]["duration_ms"], 42);
        assert!(json["metrics"].get("deferred").is_none());
        assert_eq!(json["correlation_id"], result.correlation_id.to_string());
    }

    #[test]
    fn error_envelope_carries_code_and_details() {
        let err = DomainError::new(ErrorCode::DatabaseError, "connection refused")
            .with_detail("operation", "find_stale");
        let id = CorrelationId::new();

        let json = serde_json::to_value(ErrorEnvelope::new(&err, id)).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "DATABASE_ERROR");
        assert_eq!(json["error"]["message"], "connection refused");
        assert_eq!(json["error"]["details"]["operation"], "find_stale");
        assert_eq!(json["correlation_id"], id.to_string());
    }

    #[test]
    fn breaker_snapshot_omits_half_open_timer_when_closed() {
        let json = serde_json::to_value(CircuitBreakerResponse::from(
            CircuitBreakerMetrics::default(),
        ))
        .unwrap();
        assert_eq!(json["state"], "closed");
        assert!(json.get("time_until_half_open_ms").is_none());
    }
}

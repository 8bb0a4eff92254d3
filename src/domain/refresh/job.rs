//! Refresh job audit record.

use serde::{Deserialize, Serialize};

use super::{CircuitState, JobStatus};
use crate::domain::foundation::{
    CorrelationId, ErrorCode, JobId, ProductId, StateMachine, Timestamp, ValidationError,
};

/// One refresh attempt for one product within one run.
///
/// Retries inside the attempt increment `retry_count` on the same record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshJob {
    pub id: JobId,
    pub product_id: ProductId,
    pub correlation_id: CorrelationId,
    pub status: JobStatus,
    pub created_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub retry_count: u32,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub circuit_breaker_state: Option<CircuitState>,
}

impl RefreshJob {
    /// Creates a pending job.
    pub fn new(product_id: ProductId, correlation_id: CorrelationId) -> Self {
        Self {
            id: JobId::new(),
            product_id,
            correlation_id,
            status: JobStatus::Pending,
            created_at: Timestamp::now(),
            started_at: None,
            completed_at: None,
            retry_count: 0,
            error_code: None,
            error_message: None,
            circuit_breaker_state: None,
        }
    }

    /// Moves the job to running and records `started_at`.
    pub fn start(&mut self) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(JobStatus::Running)?;
        self.started_at = Some(Timestamp::now());
        Ok(())
    }

    /// Completes the job successfully.
    pub fn succeed(&mut self, retry_count: u32, breaker: CircuitState) -> Result<(), ValidationError> {
        self.finish(JobStatus::Success, retry_count, breaker)
    }

    /// Completes the job as failed with the last error seen.
    pub fn fail(
        &mut self,
        retry_count: u32,
        breaker: CircuitState,
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Result<(), ValidationError> {
        self.finish(JobStatus::Failed, retry_count, breaker)?;
        self.error_code = Some(code.as_str().to_string());
        self.error_message = Some(message.into());
        Ok(())
    }

    /// Completes the job as skipped because the breaker is open.
    pub fn skip(&mut self, retry_count: u32, message: impl Into<String>) -> Result<(), ValidationError> {
        self.finish(JobStatus::Skipped, retry_count, CircuitState::Open)?;
        self.error_code = Some(ErrorCode::CircuitOpen.as_str().to_string());
        self.error_message = Some(message.into());
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn finish(
        &mut self,
        status: JobStatus,
        retry_count: u32,
        breaker: CircuitState,
    ) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(status)?;
        self.retry_count = retry_count;
        self.circuit_breaker_state = Some(breaker);
        self.completed_at = Some(Timestamp::now());
        Ok(())
    }
}

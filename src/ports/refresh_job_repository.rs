//! Refresh job repository port.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::refresh::RefreshJob;

/// Repository port for the refresh job audit trail.
///
/// Rows are inserted in processing order, so natural creation order
/// reflects attempt order within a run.
#[async_trait]
pub trait RefreshJobRepository: Send + Sync {
    /// Insert a new job row.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn insert(&self, job: &RefreshJob) -> Result<(), DomainError>;

    /// Update status, timestamps, error fields, retry count and breaker
    /// state of an existing job.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure or unknown job
    async fn update(&self, job: &RefreshJob) -> Result<(), DomainError>;
}

//! PostgreSQL implementation of RefreshJobRepository.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::refresh::RefreshJob;
use crate::ports::RefreshJobRepository;

/// PostgreSQL implementation of RefreshJobRepository.
#[derive(Clone)]
pub struct PostgresRefreshJobRepository {
    pool: PgPool,
}

impl PostgresRefreshJobRepository {
    /// Creates a new PostgresRefreshJobRepository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshJobRepository for PostgresRefreshJobRepository {
    async fn insert(&self, job: &RefreshJob) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_jobs (
                id, product_id, correlation_id, status, created_at,
                started_at, completed_at, retry_count,
                error_code, error_message, circuit_breaker_state
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(job.id.as_uuid())
        .bind(job.product_id.as_uuid())
        .bind(job.correlation_id.as_uuid())
        .bind(job.status.as_str())
        .bind(job.created_at.as_datetime())
        .bind(job.started_at.map(|t| *t.as_datetime()))
        .bind(job.completed_at.map(|t| *t.as_datetime()))
        .bind(job.retry_count as i32)
        .bind(job.error_code.as_deref())
        .bind(job.error_message.as_deref())
        .bind(job.circuit_breaker_state.map(|s| s.as_str()))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to insert refresh job: {}", e),
            )
        })?;

        Ok(())
    }

    async fn update(&self, job: &RefreshJob) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_jobs SET
                status = $2,
                started_at = $3,
                completed_at = $4,
                retry_count = $5,
                error_code = $6,
                error_message = $7,
                circuit_breaker_state = $8
            WHERE id = $1
            "#,
        )
        .bind(job.id.as_uuid())
        .bind(job.status.as_str())
        .bind(job.started_at.map(|t| *t.as_datetime()))
        .bind(job.completed_at.map(|t| *t.as_datetime()))
        .bind(job.retry_count as i32)
        .bind(job.error_code.as_deref())
        .bind(job.error_message.as_deref())
        .bind(job.circuit_breaker_state.map(|s| s.as_str()))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to update refresh job: {}", e),
            )
        })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                format!("Refresh job not found: {}", job.id),
            ));
        }

        Ok(())
    }
}

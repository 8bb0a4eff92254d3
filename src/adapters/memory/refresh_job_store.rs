//! In-memory refresh job store for testing and local runs.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{CorrelationId, DomainError, JobId, ProductId};
use crate::domain::refresh::{JobStatus, RefreshJob};
use crate::ports::RefreshJobRepository;

/// In-memory refresh job store.
///
/// Keeps rows in insertion order and records every status written, so tests
/// can check both the final state and the path taken.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRefreshJobStore {
    jobs: Arc<RwLock<Vec<RefreshJob>>>,
    status_history: Arc<RwLock<Vec<(JobId, JobStatus)>>>,
    fail_inserts: Arc<RwLock<bool>>,
}

impl InMemoryRefreshJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All jobs in insertion order.
    pub async fn all(&self) -> Vec<RefreshJob> {
        self.jobs.read().await.clone()
    }

    pub async fn for_product(&self, product_id: &ProductId) -> Vec<RefreshJob> {
        self.jobs
            .read()
            .await
            .iter()
            .filter(|j| &j.product_id == product_id)
            .cloned()
            .collect()
    }

    pub async fn for_run(&self, correlation_id: &CorrelationId) -> Vec<RefreshJob> {
        self.jobs
            .read()
            .await
            .iter()
            .filter(|j| &j.correlation_id == correlation_id)
            .cloned()
            .collect()
    }

    /// Statuses written for one job, oldest first.
    pub async fn status_history(&self, id: &JobId) -> Vec<JobStatus> {
        self.status_history
            .read()
            .await
            .iter()
            .filter(|(job_id, _)| job_id == id)
            .map(|(_, status)| *status)
            .collect()
    }

    /// Makes every subsequent insert fail.
    pub async fn fail_inserts(&self, fail: bool) {
        *self.fail_inserts.write().await = fail;
    }
}

#[async_trait]
impl RefreshJobRepository for InMemoryRefreshJobStore {
    async fn insert(&self, job: &RefreshJob) -> Result<(), DomainError> {
        if *self.fail_inserts.read().await {
            return Err(DomainError::database("Failed to insert refresh job: disk full"));
        }
        let mut jobs = self.jobs.write().await;
        if jobs.iter().any(|j| j.id == job.id) {
            return Err(DomainError::database(format!("Duplicate refresh job: {}", job.id)));
        }
        jobs.push(job.clone());
        self.status_history.write().await.push((job.id, job.status));
        Ok(())
    }

    async fn update(&self, job: &RefreshJob) -> Result<(), DomainError> {
        let mut jobs = self.jobs.write().await;
        match jobs.iter_mut().find(|j| j.id == job.id) {
            Some(stored) => {
                *stored = job.clone();
                self.status_history.write().await.push((job.id, job.status));
                Ok(())
            }
            None => Err(DomainError::database(format!("Refresh job not found: {}", job.id))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::refresh::CircuitState;

    #[tokio::test]
    async fn insert_then_update_tracks_history() {
        let store = InMemoryRefreshJobStore::new();
        let mut job = RefreshJob::new(ProductId::new(), CorrelationId::new());

        store.insert(&job).await.unwrap();
        job.start().unwrap();
        store.update(&job).await.unwrap();
        job.succeed(0, CircuitState::Closed).unwrap();
        store.update(&job).await.unwrap();

        assert_eq!(
            store.status_history(&job.id).await,
            vec![JobStatus::Pending, JobStatus::Running, JobStatus::Success]
        );
        assert_eq!(store.all().await[0].status, JobStatus::Success);
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected() {
        let store = InMemoryRefreshJobStore::new();
        let job = RefreshJob::new(ProductId::new(), CorrelationId::new());
        store.insert(&job).await.unwrap();
        assert!(store.insert(&job).await.is_err());
    }

    #[tokio::test]
    async fn update_of_unknown_job_fails() {
        let store = InMemoryRefreshJobStore::new();
        let job = RefreshJob::new(ProductId::new(), CorrelationId::new());
        assert!(store.update(&job).await.is_err());
    }
}

//! RefreshProductsHandler - Runs one pass of the scheduled product refresh.
//!
//! One run selects a bounded batch of stale products and processes them
//! sequentially in selection order. Each product gets exactly one job row
//! that moves pending -> running -> success | failed | skipped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::Instrument;

use crate::domain::catalog::{ItemSnapshot, PricingSnapshot, Product, StaleProductQuery};
use crate::domain::foundation::{
    CorrelationId, DomainError, ErrorCode, Timestamp, ValidationError,
};
use crate::domain::refresh::{ProductOutcome, RefreshJob, RetryPolicy, RunMetrics};
use crate::ports::{
    ApiError, CircuitBreaker, GetItemsRequest, ItemLookup, ProductApi, ProductRepository,
    RefreshJobRepository, DEFAULT_RESOURCES,
};

/// Tunables for a refresh run.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshSettings {
    /// Most products selected per run.
    pub batch_size: usize,
    /// Age after which a product is due for a refresh.
    pub stale_after: Duration,
    /// Per-product retry budget and backoff.
    pub retry: RetryPolicy,
    /// Overall budget for one run, checked between products.
    pub run_deadline: Option<Duration>,
    /// Resources requested from the upstream.
    pub resources: Vec<String>,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            stale_after: Duration::from_secs(24 * 60 * 60),
            retry: RetryPolicy::default(),
            run_deadline: Some(Duration::from_secs(600)),
            resources: DEFAULT_RESOURCES.iter().map(|r| r.to_string()).collect(),
        }
    }
}

/// Command to run one refresh pass.
#[derive(Debug, Clone)]
pub struct RefreshProductsCommand {
    pub correlation_id: CorrelationId,
}

impl RefreshProductsCommand {
    pub fn new(correlation_id: CorrelationId) -> Self {
        Self { correlation_id }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshProductsResult {
    pub correlation_id: CorrelationId,
    pub metrics: RunMetrics,
}

impl RefreshProductsResult {
    /// Human-readable summary for the trigger response.
    pub fn message(&self) -> String {
        format!("Processed {} products", self.metrics.processed)
    }
}

/// Allows at most one active run per handler.
#[derive(Debug, Default)]
struct RunGuard {
    active: AtomicBool,
}

impl RunGuard {
    fn try_acquire(&self) -> Option<RunLease<'_>> {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunLease { guard: self })
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Released on drop, including when the run future is cancelled.
struct RunLease<'a> {
    guard: &'a RunGuard,
}

impl Drop for RunLease<'_> {
    fn drop(&mut self) {
        self.guard.active.store(false, Ordering::Release);
    }
}

/// Handler for refresh runs.
pub struct RefreshProductsHandler {
    products: Arc<dyn ProductRepository>,
    jobs: Arc<dyn RefreshJobRepository>,
    api: Arc<dyn ProductApi>,
    breaker: Arc<dyn CircuitBreaker>,
    settings: RefreshSettings,
    guard: RunGuard,
}

impl RefreshProductsHandler {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        jobs: Arc<dyn RefreshJobRepository>,
        api: Arc<dyn ProductApi>,
        breaker: Arc<dyn CircuitBreaker>,
        settings: RefreshSettings,
    ) -> Self {
        Self {
            products,
            jobs,
            api,
            breaker,
            settings,
            guard: RunGuard::default(),
        }
    }

    pub fn settings(&self) -> &RefreshSettings {
        &self.settings
    }

    /// Returns true while a run is in progress.
    pub fn is_running(&self) -> bool {
        self.guard.is_active()
    }

    /// Runs one refresh pass.
    ///
    /// # Errors
    ///
    /// - `RefreshInProgress` if another run holds the guard
    /// - `DatabaseError` if stale product selection fails
    ///
    /// Per-product failures never surface here; they end up in job rows and
    /// the returned metrics.
    pub async fn handle(
        &self,
        cmd: RefreshProductsCommand,
    ) -> Result<RefreshProductsResult, DomainError> {
        let span = tracing::info_span!("refresh_run", correlation_id = %cmd.correlation_id);
        self.run(cmd.correlation_id).instrument(span).await
    }

    async fn run(&self, correlation_id: CorrelationId) -> Result<RefreshProductsResult, DomainError> {
        let _lease = self.guard.try_acquire().ok_or_else(|| {
            tracing::warn!("Refresh run rejected: another run is in progress");
            DomainError::new(
                ErrorCode::RefreshInProgress,
                "A refresh run is already in progress",
            )
        })?;

        let started = Instant::now();
        let deadline = self.settings.run_deadline.map(|budget| started + budget);
        let query = StaleProductQuery::for_run(
            Timestamp::now(),
            self.settings.stale_after,
            self.settings.batch_size,
        );

        let products = self.products.find_stale(&query).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to select stale products");
            e
        })?;
        tracing::info!(
            selected = products.len(),
            batch_size = self.settings.batch_size,
            stale_before = %query.stale_before.to_rfc3339(),
            circuit_state = %self.breaker.state(),
            "Selected stale products"
        );

        let mut metrics = RunMetrics::default();
        for (index, product) in products.iter().enumerate() {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                let remaining = (products.len() - index) as u32;
                metrics.defer(remaining);
                tracing::warn!(
                    deferred = remaining,
                    "Run deadline reached, leaving remaining products for the next run"
                );
                break;
            }

            let span = tracing::info_span!(
                "refresh_product",
                product_id = %product.id,
                item_id = %product.item_id
            );
            let outcome = self
                .refresh_product(product, correlation_id)
                .instrument(span)
                .await;
            metrics.record(outcome);
        }

        metrics.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::info!(
            processed = metrics.processed,
            success = metrics.success,
            failure = metrics.failure,
            skipped = metrics.skipped,
            deferred = metrics.deferred,
            duration_ms = metrics.duration_ms,
            "Refresh run complete"
        );

        Ok(RefreshProductsResult {
            correlation_id,
            metrics,
        })
    }

    async fn refresh_product(
        &self,
        product: &Product,
        correlation_id: CorrelationId,
    ) -> ProductOutcome {
        let mut job = RefreshJob::new(product.id, correlation_id);
        if let Err(e) = self.jobs.insert(&job).await {
            tracing::error!(error = %e, "Failed to create refresh job");
            return ProductOutcome::Failure;
        }
        tracing::debug!(job_id = %job.id, "Refresh job created");

        if let Err(e) = job.start() {
            return self.transition_failed(&job, e);
        }
        if self.save(&job).await.is_err() {
            return ProductOutcome::Failure;
        }

        if !self.breaker.allows_requests() {
            tracing::info!(job_id = %job.id, "Circuit breaker open, skipping product");
            return self
                .finish(&mut job, ProductOutcome::Skipped, |job| {
                    job.skip(0, "Circuit breaker open; upstream call not attempted")
                })
                .await;
        }

        let retry = self.settings.retry;
        let request = GetItemsRequest::single(product.item_id.clone())
            .with_resources(self.settings.resources.clone());
        let mut attempt = 1;

        loop {
            let backoff = retry.backoff_before(attempt);
            if attempt > 1 && !self.breaker.allows_requests() {
                let retries = RetryPolicy::retries_consumed(attempt);
                tracing::info!(
                    job_id = %job.id,
                    attempt,
                    "Circuit breaker opened during retries, skipping product"
                );
                return self
                    .finish(&mut job, ProductOutcome::Skipped, |job| {
                        job.skip(retries, "Circuit breaker open; retry not attempted")
                    })
                    .await;
            }
            if !backoff.is_zero() {
                tracing::debug!(
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    "Backing off before retry"
                );
                tokio::time::sleep(backoff).await;
            }

            let result = self.api.get_items(&request).await;
            let retries = RetryPolicy::retries_consumed(attempt);

            match result {
                Ok(lookup) => {
                    return match lookup.get(&product.item_id) {
                        ItemLookup::Found(item) => {
                            self.complete_refreshed(product, &mut job, &item, retries).await
                        }
                        ItemLookup::Absent => {
                            self.complete_unavailable(product, &mut job, retries, "absent from response")
                                .await
                        }
                    };
                }
                Err(err) if err.marks_unavailable() => {
                    let reason = err.to_string();
                    return self
                        .complete_unavailable(product, &mut job, retries, &reason)
                        .await;
                }
                Err(ApiError::CircuitOpen { retry_after_ms }) => {
                    tracing::info!(
                        job_id = %job.id,
                        attempt,
                        retry_after_ms,
                        "Circuit breaker opened during retries, skipping product"
                    );
                    let message = format!("Circuit breaker open; retry after {}ms", retry_after_ms);
                    return self
                        .finish(&mut job, ProductOutcome::Skipped, |job| job.skip(retries, message))
                        .await;
                }
                Err(err) if err.is_retryable() && retry.has_attempts_after(attempt) => {
                    tracing::warn!(
                        job_id = %job.id,
                        attempt,
                        max_attempts = retry.max_attempts(),
                        error_code = %err.error_code(),
                        error = %err,
                        "Attempt failed, retrying"
                    );
                    attempt += 1;
                }
                Err(err) => {
                    tracing::warn!(
                        job_id = %job.id,
                        attempt,
                        retry_count = retries,
                        error_code = %err.error_code(),
                        error = %err,
                        "Product refresh failed"
                    );
                    let state = self.breaker.state();
                    let code = err.error_code();
                    let message = err.to_string();
                    return self
                        .finish(&mut job, ProductOutcome::Failure, |job| {
                            job.fail(retries, state, code, message)
                        })
                        .await;
                }
            }
        }
    }

    async fn complete_refreshed(
        &self,
        product: &Product,
        job: &mut RefreshJob,
        item: &ItemSnapshot,
        retries: u32,
    ) -> ProductOutcome {
        let pricing = PricingSnapshot::from_item(item);
        let update = product.refreshed_update(pricing, item.raw.clone(), Timestamp::now());
        if let Err(e) = self.products.apply_update(&update).await {
            return self.store_write_failed(job, retries, e).await;
        }

        tracing::info!(
            job_id = %job.id,
            retry_count = retries,
            price = ?item.listing_price,
            "Product refreshed"
        );
        let state = self.breaker.state();
        self.finish(job, ProductOutcome::Success, |job| job.succeed(retries, state))
            .await
    }

    async fn complete_unavailable(
        &self,
        product: &Product,
        job: &mut RefreshJob,
        retries: u32,
        reason: &str,
    ) -> ProductOutcome {
        let update = product.unavailable_update(Timestamp::now());
        if let Err(e) = self.products.apply_update(&update).await {
            return self.store_write_failed(job, retries, e).await;
        }

        tracing::info!(
            job_id = %job.id,
            reason,
            last_available_at = ?product.last_refresh_at.map(|t| t.to_rfc3339()),
            "Product marked unavailable"
        );
        let state = self.breaker.state();
        self.finish(job, ProductOutcome::Success, |job| job.succeed(retries, state))
            .await
    }

    async fn store_write_failed(
        &self,
        job: &mut RefreshJob,
        retries: u32,
        error: DomainError,
    ) -> ProductOutcome {
        tracing::error!(job_id = %job.id, error = %error, "Failed to write product update");
        let state = self.breaker.state();
        self.finish(job, ProductOutcome::Failure, |job| {
            job.fail(retries, state, error.code, error.message)
        })
        .await;
        ProductOutcome::Failure
    }

    /// Applies a terminal transition and persists it.
    ///
    /// A failed transition or job write turns the outcome into a failure.
    async fn finish<F>(&self, job: &mut RefreshJob, outcome: ProductOutcome, transition: F) -> ProductOutcome
    where
        F: FnOnce(&mut RefreshJob) -> Result<(), ValidationError>,
    {
        if let Err(e) = transition(job) {
            return self.transition_failed(job, e);
        }
        match self.save(job).await {
            Ok(()) => outcome,
            Err(_) => ProductOutcome::Failure,
        }
    }

    async fn save(&self, job: &RefreshJob) -> Result<(), DomainError> {
        self.jobs.update(job).await.map_err(|e| {
            tracing::error!(job_id = %job.id, status = %job.status, error = %e, "Failed to update refresh job");
            e
        })
    }

    fn transition_failed(&self, job: &RefreshJob, error: ValidationError) -> ProductOutcome {
        tracing::error!(job_id = %job.id, status = %job.status, error = %error, "Invalid job transition");
        ProductOutcome::Failure
    }
}

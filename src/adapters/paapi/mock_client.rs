//! Mock Product API for testing and local development.
//!
//! Scripted per item id. Calls pass through a circuit breaker exactly like
//! the real client, so breaker behaviour can be exercised end to end.
//!
//! # Example
//!
//! ```ignore
//! let api = MockProductApi::new(breaker)
//!     .with_outcome(&item_id, MockOutcome::error(ApiError::Timeout { timeout_ms: 10_000 }))
//!     .with_outcome(&item_id, MockOutcome::found(snapshot));
//!
//! // First call times out, second call returns the snapshot.
//! ```

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::domain::catalog::{ItemId, ItemSnapshot};
use crate::ports::{
    ApiError, CircuitBreaker, CircuitBreakerError, CircuitBreakerExt, CircuitState,
    GetItemsRequest, ItemsLookup, ProductApi, SearchItemsRequest,
};

/// One scripted answer for an item.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Found(ItemSnapshot),
    Absent,
    Error(ApiError),
}

impl MockOutcome {
    pub fn found(snapshot: ItemSnapshot) -> Self {
        MockOutcome::Found(snapshot)
    }

    pub fn error(error: ApiError) -> Self {
        MockOutcome::Error(error)
    }
}

/// A recorded upstream call (only calls the breaker let through).
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub item_ids: Vec<ItemId>,
    pub at: tokio::time::Instant,
}

/// Mock product API.
///
/// Items with no script left answer with a default in-stock snapshot.
#[derive(Clone)]
pub struct MockProductApi {
    breaker: Arc<dyn CircuitBreaker>,
    scripts: Arc<Mutex<HashMap<ItemId, VecDeque<MockOutcome>>>>,
    search_results: Arc<Mutex<Vec<ItemSnapshot>>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
    delay: Duration,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockProductApi {
    pub fn new(breaker: Arc<dyn CircuitBreaker>) -> Self {
        Self {
            breaker,
            scripts: Arc::new(Mutex::new(HashMap::new())),
            search_results: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            delay: Duration::ZERO,
        }
    }

    /// Appends an outcome to the item's script.
    pub fn with_outcome(self, item_id: &ItemId, outcome: MockOutcome) -> Self {
        self.push_outcome(item_id, outcome);
        self
    }

    /// Appends the same outcome `times` times.
    pub fn with_repeated(self, item_id: &ItemId, outcome: MockOutcome, times: usize) -> Self {
        for _ in 0..times {
            self.push_outcome(item_id, outcome.clone());
        }
        self
    }

    /// Sets the results returned by every search.
    pub fn with_search_results(self, results: Vec<ItemSnapshot>) -> Self {
        *lock(&self.search_results) = results;
        self
    }

    /// Simulated latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn push_outcome(&self, item_id: &ItemId, outcome: MockOutcome) {
        lock(&self.scripts)
            .entry(item_id.clone())
            .or_default()
            .push_back(outcome);
    }

    /// Number of calls that reached the upstream.
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.calls).clone()
    }

    /// Calls that included the given item, in order.
    pub fn calls_for(&self, item_id: &ItemId) -> Vec<MockCall> {
        lock(&self.calls)
            .iter()
            .filter(|c| c.item_ids.contains(item_id))
            .cloned()
            .collect()
    }

    /// Default answer for unscripted items.
    pub fn default_snapshot(item_id: &ItemId) -> ItemSnapshot {
        ItemSnapshot::new(item_id.clone())
            .with_title(format!("Item {}", item_id))
            .with_prices(Some(17.99), Some(24.99))
            .with_availability("Now", "In Stock.")
            .with_reviews(100, 4.5)
    }

    fn next_outcome(&self, item_id: &ItemId) -> MockOutcome {
        lock(&self.scripts)
            .get_mut(item_id)
            .and_then(|script| script.pop_front())
            .unwrap_or_else(|| MockOutcome::Found(Self::default_snapshot(item_id)))
    }

    async fn answer(&self, request: &GetItemsRequest) -> Result<Result<ItemsLookup, ApiError>, ApiError> {
        lock(&self.calls).push(MockCall {
            item_ids: request.item_ids.clone(),
            at: tokio::time::Instant::now(),
        });
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let mut found = Vec::new();
        for id in &request.item_ids {
            match self.next_outcome(id) {
                MockOutcome::Found(mut snapshot) => {
                    snapshot.item_id = id.clone();
                    found.push(snapshot);
                }
                MockOutcome::Absent => {}
                MockOutcome::Error(err) if err.counts_as_breaker_failure() => return Err(err),
                MockOutcome::Error(err) => return Ok(Err(err)),
            }
        }
        Ok(Ok(ItemsLookup::from_found(&request.item_ids, found)))
    }
}

#[async_trait]
impl ProductApi for MockProductApi {
    async fn get_items(&self, request: &GetItemsRequest) -> Result<ItemsLookup, ApiError> {
        request.validate()?;
        match self.breaker.execute(|| self.answer(request)).await {
            Ok(outcome) => outcome,
            Err(CircuitBreakerError::Open(open)) => Err(ApiError::CircuitOpen {
                retry_after_ms: open.retry_after_ms(),
            }),
            Err(CircuitBreakerError::Inner(err)) => Err(err),
        }
    }

    async fn search_items(
        &self,
        request: &SearchItemsRequest,
    ) -> Result<Vec<ItemSnapshot>, ApiError> {
        request.validate()?;
        let results = lock(&self.search_results).clone();
        Ok(results
            .into_iter()
            .take(request.item_count as usize)
            .collect())
    }

    fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::resilience::InMemoryCircuitBreaker;
    use crate::ports::{CircuitBreakerConfig, ItemLookup};

    fn id(n: u32) -> ItemId {
        ItemId::new(format!("B{:09}", n)).unwrap()
    }

    fn breaker(threshold: u32) -> Arc<dyn CircuitBreaker> {
        Arc::new(InMemoryCircuitBreaker::new(
            "mock",
            CircuitBreakerConfig::new(threshold, Duration::from_secs(60)),
        ))
    }

    #[tokio::test]
    async fn unscripted_item_is_found() {
        let api = MockProductApi::new(breaker(5));
        let lookup = api.get_items(&GetItemsRequest::single(id(1))).await.unwrap();
        assert!(matches!(lookup.get(&id(1)), ItemLookup::Found(_)));
        assert_eq!(api.call_count(), 1);
    }

    #[tokio::test]
    async fn scripted_outcomes_are_consumed_in_order() {
        let api = MockProductApi::new(breaker(5))
            .with_outcome(&id(1), MockOutcome::error(ApiError::Network("reset".into())))
            .with_outcome(&id(1), MockOutcome::Absent);

        assert!(api.get_items(&GetItemsRequest::single(id(1))).await.is_err());
        let lookup = api.get_items(&GetItemsRequest::single(id(1))).await.unwrap();
        assert_eq!(lookup.get(&id(1)), ItemLookup::Absent);
    }

    #[tokio::test]
    async fn transient_errors_trip_the_breaker() {
        let api = MockProductApi::new(breaker(2)).with_repeated(
            &id(1),
            MockOutcome::error(ApiError::Timeout { timeout_ms: 10 }),
            3,
        );

        for _ in 0..2 {
            let _ = api.get_items(&GetItemsRequest::single(id(1))).await;
        }
        let err = api.get_items(&GetItemsRequest::single(id(1))).await.unwrap_err();

        assert!(matches!(err, ApiError::CircuitOpen { .. }));
        assert_eq!(api.call_count(), 2);
        assert_eq!(api.circuit_state(), CircuitState::Open);
    }

    #[tokio::test]
    async fn item_errors_do_not_trip_the_breaker() {
        let api = MockProductApi::new(breaker(1)).with_outcome(
            &id(1),
            MockOutcome::error(ApiError::ItemNotAccessible {
                code: "ItemNotAccessible".into(),
                message: "gone".into(),
            }),
        );

        let err = api.get_items(&GetItemsRequest::single(id(1))).await.unwrap_err();

        assert!(err.marks_unavailable());
        assert_eq!(api.circuit_state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn search_returns_configured_results() {
        let api = MockProductApi::new(breaker(5)).with_search_results(vec![
            ItemSnapshot::new(id(1)),
            ItemSnapshot::new(id(2)),
        ]);
        let results = api
            .search_items(&SearchItemsRequest::new("kettle").with_item_count(1))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
    }
}

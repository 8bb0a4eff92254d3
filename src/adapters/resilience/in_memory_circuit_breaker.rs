//! In-process circuit breaker.
//!
//! State lives behind a `std::sync::Mutex` so every admission decision and
//! transition is atomic, including the single half-open probe slot. Times
//! are `tokio::time::Instant` so paused-clock tests drive the cooldown.
//!
//! State is not persisted: a fresh process always starts closed.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

use crate::domain::foundation::Timestamp;
use crate::ports::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerMetrics, CircuitOpenError, CircuitState,
};

/// Circuit breaker shared by every caller of one upstream dependency.
#[derive(Debug)]
pub struct InMemoryCircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerState>,
}

#[derive(Debug, Default)]
struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    last_failure_at: Option<Instant>,
    probe_in_flight: bool,
    totals: Totals,
}

#[derive(Debug, Default, Clone, Copy)]
struct Totals {
    successes: u64,
    failures: u64,
    requests: u64,
    rejected: u64,
    opened: u64,
    closed: u64,
}

impl InMemoryCircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(BreakerState::default()),
        }
    }

    /// Breaker with default thresholds.
    pub fn with_defaults(name: impl Into<String>) -> Self {
        Self::new(name, CircuitBreakerConfig::default())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        // Transitions never panic mid-update, so a poisoned guard is still consistent.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn remaining_cooldown(&self, state: &BreakerState, now: Instant) -> Duration {
        match state.last_failure_at {
            Some(at) => self
                .config
                .cooldown_timeout
                .saturating_sub(now.saturating_duration_since(at)),
            None => Duration::ZERO,
        }
    }

    fn transition(&self, state: &mut BreakerState, to: CircuitState, now: Instant) {
        let from = state.state;
        if from == to {
            return;
        }
        state.state = to;
        match to {
            CircuitState::Open => {
                state.last_failure_at = Some(now);
                state.probe_in_flight = false;
                state.totals.opened += 1;
                tracing::warn!(
                    breaker = %self.name,
                    previous_state = %from,
                    new_state = %to,
                    failure_count = state.failure_count,
                    success_count = state.success_count,
                    cooldown_ms = self.config.cooldown_timeout.as_millis() as u64,
                    at = %Timestamp::now().to_rfc3339(),
                    "Circuit breaker opened"
                );
            }
            CircuitState::HalfOpen => {
                tracing::info!(
                    breaker = %self.name,
                    previous_state = %from,
                    new_state = %to,
                    failure_count = state.failure_count,
                    success_count = state.success_count,
                    at = %Timestamp::now().to_rfc3339(),
                    "Circuit breaker half-open, admitting probe"
                );
            }
            CircuitState::Closed => {
                state.failure_count = 0;
                state.success_count = 0;
                state.probe_in_flight = false;
                state.totals.closed += 1;
                tracing::info!(
                    breaker = %self.name,
                    previous_state = %from,
                    new_state = %to,
                    at = %Timestamp::now().to_rfc3339(),
                    "Circuit breaker closed"
                );
            }
        }
    }
}

impl CircuitBreaker for InMemoryCircuitBreaker {
    fn state(&self) -> CircuitState {
        self.lock().state
    }

    fn allows_requests(&self) -> bool {
        let state = self.lock();
        match state.state {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => !state.probe_in_flight,
            CircuitState::Open => self.remaining_cooldown(&state, Instant::now()).is_zero(),
        }
    }

    fn try_acquire(&self) -> Result<(), CircuitOpenError> {
        let now = Instant::now();
        let mut state = self.lock();
        state.totals.requests += 1;

        match state.state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open => {
                let retry_after = self.remaining_cooldown(&state, now);
                if retry_after.is_zero() {
                    self.transition(&mut state, CircuitState::HalfOpen, now);
                    state.probe_in_flight = true;
                    Ok(())
                } else {
                    state.totals.rejected += 1;
                    tracing::debug!(
                        breaker = %self.name,
                        retry_after_ms = retry_after.as_millis() as u64,
                        "Circuit breaker rejected call"
                    );
                    Err(CircuitOpenError { retry_after })
                }
            }
            CircuitState::HalfOpen => {
                if state.probe_in_flight {
                    state.totals.rejected += 1;
                    Err(CircuitOpenError {
                        retry_after: Duration::ZERO,
                    })
                } else {
                    state.probe_in_flight = true;
                    Ok(())
                }
            }
        }
    }

    fn record_success(&self) {
        let now = Instant::now();
        let mut state = self.lock();
        state.totals.successes += 1;
        state.failure_count = 0;
        state.success_count = state.success_count.saturating_add(1);

        if state.state == CircuitState::HalfOpen {
            self.transition(&mut state, CircuitState::Closed, now);
        }
    }

    fn record_failure(&self) {
        let now = Instant::now();
        let mut state = self.lock();
        state.totals.failures += 1;
        state.success_count = 0;
        state.failure_count = state.failure_count.saturating_add(1);

        match state.state {
            CircuitState::Closed if state.failure_count >= self.config.failure_threshold => {
                self.transition(&mut state, CircuitState::Open, now);
            }
            CircuitState::Closed => {
                tracing::debug!(
                    breaker = %self.name,
                    failure_count = state.failure_count,
                    threshold = self.config.failure_threshold,
                    "Circuit breaker recorded failure"
                );
            }
            CircuitState::HalfOpen => {
                self.transition(&mut state, CircuitState::Open, now);
            }
            CircuitState::Open => {}
        }
    }

    fn reset(&self) {
        let now = Instant::now();
        let mut state = self.lock();
        self.transition(&mut state, CircuitState::Closed, now);
        state.failure_count = 0;
        state.success_count = 0;
        state.last_failure_at = None;
        state.probe_in_flight = false;
    }

    fn force_open(&self) {
        let now = Instant::now();
        let mut state = self.lock();
        if state.state == CircuitState::Open {
            state.last_failure_at = Some(now);
        } else {
            self.transition(&mut state, CircuitState::Open, now);
        }
    }

    fn metrics(&self) -> CircuitBreakerMetrics {
        let now = Instant::now();
        let state = self.lock();
        let time_until_half_open = match state.state {
            CircuitState::Open => Some(self.remaining_cooldown(&state, now)),
            _ => None,
        };
        CircuitBreakerMetrics {
            state: state.state,
            total_successes: state.totals.successes,
            total_failures: state.totals.failures,
            total_requests: state.totals.requests,
            rejected_requests: state.totals.rejected,
            times_opened: state.totals.opened,
            times_closed: state.totals.closed,
            current_failures: state.failure_count,
            current_successes: state.success_count,
            time_until_half_open,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{CircuitBreakerError, CircuitBreakerExt};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn breaker(threshold: u32, cooldown_ms: u64) -> InMemoryCircuitBreaker {
        InMemoryCircuitBreaker::new(
            "test",
            CircuitBreakerConfig::new(threshold, Duration::from_millis(cooldown_ms)),
        )
    }

    fn trip(breaker: &InMemoryCircuitBreaker, times: u32) {
        for _ in 0..times {
            breaker.try_acquire().unwrap();
            breaker.record_failure();
        }
    }

    #[test]
    fn starts_closed() {
        let b = breaker(5, 1_000);
        assert_eq!(b.state(), CircuitState::Closed);
        assert!(b.allows_requests());
    }

    #[test]
    fn opens_after_exactly_threshold_consecutive_failures() {
        let b = breaker(5, 1_000);
        trip(&b, 4);
        assert_eq!(b.state(), CircuitState::Closed);
        trip(&b, 1);
        assert_eq!(b.state(), CircuitState::Open);
        assert_eq!(b.metrics().times_opened, 1);
    }

    #[test]
    fn success_resets_failure_count() {
        let b = breaker(3, 1_000);
        trip(&b, 2);
        b.try_acquire().unwrap();
        b.record_success();
        assert_eq!(b.metrics().current_failures, 0);

        trip(&b, 2);
        assert_eq!(b.state(), CircuitState::Closed);
    }

    #[test]
    fn failure_resets_success_count() {
        let b = breaker(3, 1_000);
        b.record_success();
        b.record_success();
        assert_eq!(b.metrics().current_successes, 2);
        b.record_failure();
        let metrics = b.metrics();
        assert_eq!(metrics.current_successes, 0);
        assert_eq!(metrics.current_failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn open_circuit_rejects_without_invoking_operation() {
        let b = breaker(1, 10_000);
        trip(&b, 1);
        tokio::time::advance(Duration::from_millis(4_000)).await;

        let calls = AtomicU32::new(0);
        let result = b
            .execute(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(())
            })
            .await;

        match result {
            Err(CircuitBreakerError::Open(open)) => {
                assert_eq!(open.retry_after, Duration::from_millis(6_000));
            }
            other => panic!("expected open rejection, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(b.metrics().rejected_requests, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn call_after_cooldown_becomes_probe() {
        let b = breaker(1, 10_000);
        trip(&b, 1);
        assert!(!b.allows_requests());

        tokio::time::advance(Duration::from_millis(10_000)).await;
        assert!(b.allows_requests());
        assert_eq!(b.state(), CircuitState::Open);

        b.try_acquire().unwrap();
        assert_eq!(b.state(), CircuitState::HalfOpen);
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_admits_a_single_probe() {
        let b = breaker(1, 1_000);
        trip(&b, 1);
        tokio::time::advance(Duration::from_millis(1_000)).await;

        assert!(b.try_acquire().is_ok());
        let second = b.try_acquire().unwrap_err();
        assert_eq!(second.retry_after, Duration::ZERO);
        assert!(!b.allows_requests());
    }

    #[tokio::test(start_paused = true)]
    async fn probe_success_closes_and_resets_counters() {
        let b = breaker(2, 1_000);
        trip(&b, 2);
        tokio::time::advance(Duration::from_millis(1_000)).await;

        let result = b.execute(|| async { Ok::<_, String>(42) }).await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(b.state(), CircuitState::Closed);
        let metrics = b.metrics();
        assert_eq!(metrics.current_failures, 0);
        assert_eq!(metrics.current_successes, 0);
        assert_eq!(metrics.times_closed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn probe_failure_reopens_with_fresh_cooldown() {
        let b = breaker(1, 1_000);
        trip(&b, 1);
        tokio::time::advance(Duration::from_millis(1_500)).await;

        let result = b.execute(|| async { Err::<(), _>("still down") }).await;
        assert!(matches!(result, Err(CircuitBreakerError::Inner("still down"))));
        assert_eq!(b.state(), CircuitState::Open);

        let err = b.try_acquire().unwrap_err();
        assert_eq!(err.retry_after, Duration::from_millis(1_000));
        assert_eq!(b.metrics().times_opened, 2);
    }

    #[test]
    fn force_open_and_reset() {
        let b = breaker(5, 60_000);
        b.force_open();
        assert_eq!(b.state(), CircuitState::Open);
        assert!(b.try_acquire().is_err());

        b.reset();
        assert_eq!(b.state(), CircuitState::Closed);
        assert!(b.try_acquire().is_ok());
    }

    #[test]
    fn totals_are_monotonic_across_resets() {
        let b = breaker(1, 60_000);
        b.try_acquire().unwrap();
        b.record_success();
        trip(&b, 1);
        b.reset();

        let metrics = b.metrics();
        assert_eq!(metrics.total_successes, 1);
        assert_eq!(metrics.total_failures, 1);
        assert_eq!(metrics.total_requests, 2);
        assert_eq!(metrics.times_opened, 1);
        assert_eq!(metrics.times_closed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn metrics_report_time_until_half_open() {
        let b = breaker(1, 5_000);
        trip(&b, 1);
        tokio::time::advance(Duration::from_millis(2_000)).await;
        assert_eq!(
            b.metrics().time_until_half_open,
            Some(Duration::from_millis(3_000))
        );
    }

    #[tokio::test]
    async fn works_through_a_trait_object() {
        let b: std::sync::Arc<dyn CircuitBreaker> = std::sync::Arc::new(breaker(5, 1_000));
        let result = b.execute(|| async { Ok::<_, String>("ok") }).await;
        assert_eq!(result.unwrap(), "ok");
        assert_eq!(b.metrics().total_successes, 1);
    }
}

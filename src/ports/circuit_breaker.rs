//! CircuitBreaker port - Interface for upstream dependency resilience.
//!
//! The circuit breaker stops the refresh worker from hammering the product
//! API while it is throttling or down, and probes for recovery on its own.
//!
//! ## States
//!
//! - **Closed**: Normal operation, requests flow through
//! - **Open**: Too many consecutive failures, requests rejected immediately
//! - **Half-Open**: Cooldown elapsed, exactly one probe request allowed
//!
//! ## Transitions
//!
//! ```text
//! Closed --[failure_threshold consecutive failures]--> Open
//! Open --[next call after cooldown_timeout]--> Half-Open
//! Half-Open --[probe success]--> Closed
//! Half-Open --[probe failure]--> Open (cooldown restarted)
//! ```
//!
//! The Open -> Half-Open transition is lazy: it happens inside
//! [`CircuitBreaker::try_acquire`], never on a timer.

use std::future::Future;
use std::time::Duration;

pub use crate::domain::refresh::CircuitState;

/// Configuration for circuit breaker behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Number of consecutive failures before opening the circuit.
    ///
    /// Default: 5 failures
    pub failure_threshold: u32,

    /// Time to wait after the last failure before allowing a probe.
    ///
    /// Default: 5 minutes
    pub cooldown_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown_timeout: Duration::from_millis(300_000),
        }
    }
}

impl CircuitBreakerConfig {
    pub fn new(failure_threshold: u32, cooldown_timeout: Duration) -> Self {
        Self {
            failure_threshold,
            cooldown_timeout,
        }
    }
}

/// Returned when the breaker rejects a call without invoking it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("circuit breaker is open: retry after {}ms", .retry_after.as_millis())]
pub struct CircuitOpenError {
    /// Remaining cooldown. Zero while a half-open probe is in flight.
    pub retry_after: Duration,
}

impl CircuitOpenError {
    pub fn retry_after_ms(&self) -> u64 {
        u64::try_from(self.retry_after.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Error from [`CircuitBreakerExt::execute`].
#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    /// The operation was not invoked.
    #[error(transparent)]
    Open(CircuitOpenError),

    /// The operation ran and failed. The failure has been recorded.
    #[error("{0}")]
    Inner(E),
}

/// Port for circuit breaker functionality.
///
/// Implementations must make every state transition atomic with respect to
/// concurrent callers; in particular only one caller may win the half-open
/// probe slot.
///
/// # Example
///
/// ```ignore
/// let result = breaker
///     .execute(|| async { client.send(request).await })
///     .await;
///
/// match result {
///     Ok(response) => { /* recorded as success */ }
///     Err(CircuitBreakerError::Open(open)) => { /* skip, retry after open.retry_after */ }
///     Err(CircuitBreakerError::Inner(err)) => { /* recorded as failure */ }
/// }
/// ```
pub trait CircuitBreaker: Send + Sync {
    /// Get the current state of the circuit without transitioning it.
    fn state(&self) -> CircuitState;

    /// Check whether the next call would be admitted.
    ///
    /// True when closed, half-open, or open with the cooldown elapsed (the
    /// next call will become the probe). Does not change state.
    fn allows_requests(&self) -> bool;

    /// Admission decision for one call.
    ///
    /// Performs the lazy Open -> Half-Open transition and claims the probe
    /// slot. Every `Ok` must be followed by exactly one `record_success` or
    /// `record_failure`.
    fn try_acquire(&self) -> Result<(), CircuitOpenError>;

    /// Record a successful call.
    ///
    /// Resets the consecutive failure count. In half-open state this closes
    /// the circuit.
    fn record_success(&self);

    /// Record a failed call.
    ///
    /// In closed state this counts toward the failure threshold.
    /// In half-open state this immediately reopens the circuit.
    fn record_failure(&self);

    /// Force reset the circuit to closed state.
    ///
    /// Use sparingly - typically for administrative intervention.
    fn reset(&self);

    /// Trip the circuit now, starting a fresh cooldown.
    fn force_open(&self);

    /// Get metrics about the circuit breaker.
    fn metrics(&self) -> CircuitBreakerMetrics;
}

/// Runs operations under a [`CircuitBreaker`].
pub trait CircuitBreakerExt: CircuitBreaker {
    /// Admits, runs and records one operation.
    ///
    /// `Err` from the operation counts as a failure. Operations that want
    /// some errors to count as success should return them inside `Ok`.
    fn execute<F, Fut, T, E>(
        &self,
        operation: F,
    ) -> impl Future<Output = Result<T, CircuitBreakerError<E>>> + Send
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
        T: Send,
        E: Send;
}

impl<B: CircuitBreaker + ?Sized> CircuitBreakerExt for B {
    fn execute<F, Fut, T, E>(
        &self,
        operation: F,
    ) -> impl Future<Output = Result<T, CircuitBreakerError<E>>> + Send
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
        T: Send,
        E: Send,
    {
        async move {
            self.try_acquire().map_err(CircuitBreakerError::Open)?;
            match operation().await {
                Ok(value) => {
                    self.record_success();
                    Ok(value)
                }
                Err(err) => {
                    self.record_failure();
                    Err(CircuitBreakerError::Inner(err))
                }
            }
        }
    }
}

/// Metrics about circuit breaker behavior.
///
/// Totals are monotonic for the process lifetime; `current_*` counters are
/// the resettable ones that drive transitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CircuitBreakerMetrics {
    /// Current state
    pub state: CircuitState,

    /// Total successful calls since creation
    pub total_successes: u64,

    /// Total failed calls since creation
    pub total_failures: u64,

    /// Total admission attempts since creation, rejected ones included
    pub total_requests: u64,

    /// Calls rejected while open or while a probe was in flight
    pub rejected_requests: u64,

    /// Times the circuit has opened
    pub times_opened: u64,

    /// Times the circuit has closed after being open
    pub times_closed: u64,

    /// Current consecutive failure count
    pub current_failures: u32,

    /// Current consecutive success count
    pub current_successes: u32,

    /// Time until the next call may probe (when open)
    pub time_until_half_open: Option<Duration>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = CircuitBreakerConfig::default();
        assert_eq!(config.failure_threshold, 5);
        assert_eq!(config.cooldown_timeout, Duration::from_secs(300));
    }

    #[test]
    fn open_error_reports_milliseconds() {
        let err = CircuitOpenError {
            retry_after: Duration::from_millis(1_500),
        };
        assert_eq!(err.retry_after_ms(), 1_500);
        assert_eq!(err.to_string(), "circuit breaker is open: retry after 1500ms");
    }

    #[test]
    fn inner_error_displays_the_wrapped_error() {
        let err: CircuitBreakerError<String> = CircuitBreakerError::Inner("boom".into());
        assert_eq!(err.to_string(), "boom");
    }
}

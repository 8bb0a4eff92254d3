//! Circuit breaker configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::ports::CircuitBreakerConfig;

/// Breaker thresholds for the upstream API.
#[derive(Debug, Clone, Deserialize)]
pub struct CircuitBreakerSettings {
    /// Consecutive failures that open the circuit
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Time the circuit stays open before a probe, in milliseconds
    #[serde(default = "default_cooldown_timeout_ms")]
    pub cooldown_timeout_ms: u64,
}

impl CircuitBreakerSettings {
    pub fn breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig::new(
            self.failure_threshold,
            Duration::from_millis(self.cooldown_timeout_ms),
        )
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.failure_threshold == 0 {
            return Err(ValidationError::InvalidFailureThreshold);
        }
        if self.cooldown_timeout_ms == 0 {
            return Err(ValidationError::InvalidCooldown);
        }
        Ok(())
    }
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            cooldown_timeout_ms: default_cooldown_timeout_ms(),
        }
    }
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_cooldown_timeout_ms() -> u64 {
    300_000
}

//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address: {0}")]
    InvalidHost(String),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("PA-API base URL must be http(s)")]
    InvalidBaseUrl,

    #[error("Upstream timeout must be between 1 and 60000 ms")]
    InvalidUpstreamTimeout,

    #[error("Batch size must be between 1 and 100")]
    InvalidBatchSize,

    #[error("Retry policy must allow at most 10 retries with a positive base backoff")]
    InvalidRetryPolicy,

    #[error("Stale threshold must be positive")]
    InvalidStaleThreshold,

    #[error("Circuit breaker failure threshold must be positive")]
    InvalidFailureThreshold,

    #[error("Circuit breaker cooldown must be positive")]
    InvalidCooldown,
}

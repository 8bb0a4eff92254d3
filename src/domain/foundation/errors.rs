//! Error types for the domain layer.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: i64,
        max: i64,
        actual: i64,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an out of range validation error.
    pub fn out_of_range(field: impl Into<String>, min: i64, max: i64, actual: i64) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Coarse error taxonomy used to decide retry, skip and propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input to a request-shaped operation. Never retried.
    Validation,
    /// The upstream says the item itself is gone or invalid. Expected outcome.
    UpstreamItem,
    /// Throttling, timeouts, transport and generic upstream failures. Retried.
    UpstreamTransient,
    /// The breaker is protecting the dependency. Skipped, never retried.
    CircuitOpen,
    /// Reading or writing the backing store failed.
    Store,
    /// Required configuration is missing or invalid.
    Configuration,
    /// Anything else.
    Internal,
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,
    InvalidItemId,
    MethodNotAllowed,

    // Upstream item errors
    ItemNotAccessible,
    InvalidParameter,

    // Upstream transient errors
    Throttled,
    InvalidCredentials,
    UpstreamTimeout,
    UpstreamError,
    NetworkError,

    // Resilience
    CircuitOpen,

    // Infrastructure errors
    DatabaseError,
    ConfigurationError,
    RefreshInProgress,
    RequestTimeout,
    InternalError,
}

impl ErrorCode {
    /// Wire representation (SCREAMING_SNAKE_CASE).
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::InvalidItemId => "INVALID_ITEM_ID",
            ErrorCode::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            ErrorCode::ItemNotAccessible => "ITEM_NOT_ACCESSIBLE",
            ErrorCode::InvalidParameter => "INVALID_PARAMETER",
            ErrorCode::Throttled => "THROTTLED",
            ErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorCode::UpstreamTimeout => "UPSTREAM_TIMEOUT",
            ErrorCode::UpstreamError => "UPSTREAM_ERROR",
            ErrorCode::NetworkError => "NETWORK_ERROR",
            ErrorCode::CircuitOpen => "CIRCUIT_OPEN",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::ConfigurationError => "CONFIGURATION_ERROR",
            ErrorCode::RefreshInProgress => "REFRESH_IN_PROGRESS",
            ErrorCode::RequestTimeout => "REQUEST_TIMEOUT",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Taxonomy bucket for this code.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ErrorCode::ValidationFailed | ErrorCode::InvalidItemId | ErrorCode::MethodNotAllowed => {
                ErrorKind::Validation
            }
            ErrorCode::ItemNotAccessible | ErrorCode::InvalidParameter => ErrorKind::UpstreamItem,
            ErrorCode::Throttled
            | ErrorCode::InvalidCredentials
            | ErrorCode::UpstreamTimeout
            | ErrorCode::UpstreamError
            | ErrorCode::NetworkError => ErrorKind::UpstreamTransient,
            ErrorCode::CircuitOpen => ErrorKind::CircuitOpen,
            ErrorCode::DatabaseError => ErrorKind::Store,
            ErrorCode::ConfigurationError => ErrorKind::Configuration,
            ErrorCode::RefreshInProgress
            | ErrorCode::RequestTimeout
            | ErrorCode::InternalError => ErrorKind::Internal,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Standard domain error with code, message, and optional details.
#[derive(Debug, Clone)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    /// Creates a new domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Creates a validation error for a specific field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message).with_detail("field", field.into())
    }

    /// Creates a store error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        self.code.kind()
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        DomainError::new(ErrorCode::ValidationFailed, err.to_string())
    }
}

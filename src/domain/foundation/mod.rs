//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, the state machine trait and the
//! error taxonomy shared by the catalog and refresh modules.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ErrorKind, ValidationError};
pub use ids::{CorrelationId, JobId, ProductId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;

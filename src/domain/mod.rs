//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors, state machine)
//! - `catalog` - Products, item identifiers, pricing and stale selection
//! - `refresh` - Refresh jobs, retry policy and run metrics

pub mod catalog;
pub mod foundation;
pub mod refresh;

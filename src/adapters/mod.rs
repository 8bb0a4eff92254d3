//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `paapi` - Product Advertising API client, request signer and mock
//! - `resilience` - In-process circuit breaker
//! - `postgres` - Product and refresh job repositories
//! - `memory` - In-memory stores for tests and local runs
//! - `http` - Axum trigger and health endpoints

pub mod http;
pub mod memory;
pub mod paapi;
pub mod postgres;
pub mod resilience;

pub use memory::{InMemoryProductStore, InMemoryRefreshJobStore};
pub use paapi::{MockProductApi, PaapiClient, PaapiClientConfig, SigV4Signer};
pub use postgres::{PostgresProductRepository, PostgresRefreshJobRepository};
pub use resilience::InMemoryCircuitBreaker;

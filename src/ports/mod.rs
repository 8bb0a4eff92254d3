//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Upstream Ports
//!
//! - `ProductApi` - Item lookup and search against the product-data service
//! - `RequestSigner` - Per-call request signing
//! - `CircuitBreaker` - Upstream dependency resilience
//!
//! ## Store Ports
//!
//! - `ProductRepository` - Stale product selection and refresh write-back
//! - `RefreshJobRepository` - Refresh job audit trail

mod circuit_breaker;
mod product_api;
mod product_repository;
mod refresh_job_repository;
mod request_signer;

pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitBreakerExt,
    CircuitBreakerMetrics, CircuitOpenError, CircuitState,
};
pub use product_api::{
    ApiError, GetItemsRequest, ItemLookup, ItemsLookup, ProductApi, SearchItemsRequest,
    DEFAULT_RESOURCES, MAX_ITEM_IDS, MAX_SEARCH_RESULTS,
};
pub use product_repository::ProductRepository;
pub use refresh_job_repository::RefreshJobRepository;
pub use request_signer::{RequestSigner, SignableRequest};

//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresProductRepository` - Stale selection and refresh writes on `products`
//! - `PostgresRefreshJobRepository` - Audit rows in `refresh_jobs`

mod product_repository;
mod refresh_job_repository;

pub use product_repository::PostgresProductRepository;
pub use refresh_job_repository::PostgresRefreshJobRepository;

//! In-memory store adapters for tests and local development.

mod product_store;
mod refresh_job_store;

pub use product_store::InMemoryProductStore;
pub use refresh_job_store::InMemoryRefreshJobStore;

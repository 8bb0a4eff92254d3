//! Catalog Refresh - Scheduled product refresh worker
//!
//! Re-fetches pricing and availability for stale catalog products from the
//! Product Advertising API, guarded by a circuit breaker and per-item
//! retries, and records every attempt as a refresh job.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;

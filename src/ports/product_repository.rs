//! Product repository port.
//!
//! The products table belongs to the catalog. The refresh worker only
//! selects stale rows and writes refresh-derived fields back.

use async_trait::async_trait;

use crate::domain::catalog::{Product, ProductUpdate, StaleProductQuery};
use crate::domain::foundation::DomainError;

/// Repository port for catalog products.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Select products due for a refresh.
    ///
    /// Must honour [`StaleProductQuery::matches`], order by
    /// `last_refresh_at` ascending with nulls first, and return at most
    /// `query.limit` rows.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on query failure
    async fn find_stale(&self, query: &StaleProductQuery) -> Result<Vec<Product>, DomainError>;

    /// Write refresh-derived fields for one product.
    ///
    /// Never touches title, description or custom metadata.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure or unknown product
    async fn apply_update(&self, update: &ProductUpdate) -> Result<(), DomainError>;
}

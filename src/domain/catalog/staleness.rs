//! Stale-product selection rule.

use std::time::Duration;

use super::Product;
use crate::domain::foundation::Timestamp;

/// Query for the next batch of products due for a refresh.
///
/// A product is stale when its status is refreshable and it was either never
/// refreshed or last refreshed strictly before `stale_before`. Results are
/// ordered by `last_refresh_at` ascending with never-refreshed products first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaleProductQuery {
    pub stale_before: Timestamp,
    pub limit: usize,
}

impl StaleProductQuery {
    pub fn new(stale_before: Timestamp, limit: usize) -> Self {
        Self {
            stale_before,
            limit,
        }
    }

    /// Query for a run starting at `now`.
    pub fn for_run(now: Timestamp, stale_after: Duration, limit: usize) -> Self {
        Self::new(now.minus(stale_after), limit)
    }

    /// Returns true if the product is due for a refresh.
    pub fn matches(&self, product: &Product) -> bool {
        product.status.is_refreshable()
            && match product.last_refresh_at {
                None => true,
                Some(at) => at.is_before(&self.stale_before),
            }
    }

    /// Applies the query to an in-memory collection.
    pub fn select<'a, I>(&self, products: I) -> Vec<Product>
    where
        I: IntoIterator<Item = &'a Product>,
    {
        let mut stale: Vec<Product> = products
            .into_iter()
            .filter(|p| self.matches(p))
            .cloned()
            .collect();
        // Option orders None before Some, which gives nulls-first.
        stale.sort_by_key(|p| p.last_refresh_at);
        stale.truncate(self.limit);
        stale
    }
}

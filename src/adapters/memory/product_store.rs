//! In-memory product store for testing and local runs.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::catalog::{Product, ProductUpdate, StaleProductQuery};
use crate::domain::foundation::{DomainError, ProductId};
use crate::ports::ProductRepository;

/// In-memory product store.
///
/// Selection uses [`StaleProductQuery::select`], the same rule the Postgres
/// adapter expresses in SQL. Failures can be injected for store-error tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductStore {
    products: Arc<RwLock<Vec<Product>>>,
    fail_selection: Arc<RwLock<bool>>,
    failing_updates: Arc<RwLock<HashSet<ProductId>>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the given products.
    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            products: Arc::new(RwLock::new(products)),
            ..Self::default()
        }
    }

    pub async fn insert(&self, product: Product) {
        self.products.write().await.push(product);
    }

    pub async fn get(&self, id: &ProductId) -> Option<Product> {
        self.products
            .read()
            .await
            .iter()
            .find(|p| &p.id == id)
            .cloned()
    }

    pub async fn all(&self) -> Vec<Product> {
        self.products.read().await.clone()
    }

    /// Makes every subsequent `find_stale` fail.
    pub async fn fail_selection(&self, fail: bool) {
        *self.fail_selection.write().await = fail;
    }

    /// Makes updates to one product fail.
    pub async fn fail_updates_for(&self, id: ProductId) {
        self.failing_updates.write().await.insert(id);
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductStore {
    async fn find_stale(&self, query: &StaleProductQuery) -> Result<Vec<Product>, DomainError> {
        if *self.fail_selection.read().await {
            return Err(DomainError::database("Failed to select stale products: connection refused"));
        }
        let products = self.products.read().await;
        Ok(query.select(products.iter()))
    }

    async fn apply_update(&self, update: &ProductUpdate) -> Result<(), DomainError> {
        let id = update.product_id();
        if self.failing_updates.read().await.contains(&id) {
            return Err(DomainError::database(format!("Failed to update product: {}", id)));
        }
        let mut products = self.products.write().await;
        match products.iter_mut().find(|p| p.id == id) {
            Some(product) => {
                product.apply(update);
                Ok(())
            }
            None => Err(DomainError::database(format!("Product not found: {}", id))),
        }
    }
}

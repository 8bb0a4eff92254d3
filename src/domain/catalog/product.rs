//! Catalog product as seen by the refresh worker.

use serde::{Deserialize, Serialize};

use super::{ItemId, PricingSnapshot, ProductStatus};
use crate::domain::foundation::{ProductId, Timestamp};

/// A catalog product row. Only the refresh-derived fields are written by
/// this service; everything else belongs to the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub item_id: ItemId,
    pub status: ProductStatus,
    /// `None` means the product has never been refreshed.
    pub last_refresh_at: Option<Timestamp>,
    pub last_available_at: Option<Timestamp>,
    pub pricing: PricingSnapshot,
    pub raw_snapshot: Option<serde_json::Value>,
}

impl Product {
    /// Creates a never-refreshed active product.
    pub fn new(item_id: ItemId) -> Self {
        Self {
            id: ProductId::new(),
            item_id,
            status: ProductStatus::Active,
            last_refresh_at: None,
            last_available_at: None,
            pricing: PricingSnapshot::default(),
            raw_snapshot: None,
        }
    }

    pub fn with_status(mut self, status: ProductStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_last_refresh_at(mut self, at: Timestamp) -> Self {
        self.last_refresh_at = Some(at);
        self
    }

    /// Update written after fresh data was fetched. Status is left unchanged.
    pub fn refreshed_update(
        &self,
        pricing: PricingSnapshot,
        raw_snapshot: serde_json::Value,
        refreshed_at: Timestamp,
    ) -> ProductUpdate {
        ProductUpdate::Refreshed {
            product_id: self.id,
            pricing,
            raw_snapshot,
            refreshed_at,
        }
    }

    /// Update written when the upstream no longer offers the item.
    ///
    /// The previous refresh time becomes the last time the item was known
    /// to be available.
    pub fn unavailable_update(&self, refreshed_at: Timestamp) -> ProductUpdate {
        ProductUpdate::Unavailable {
            product_id: self.id,
            last_available_at: self.last_refresh_at,
            refreshed_at,
        }
    }

    /// Applies an update in place. Updates for another product are ignored.
    pub fn apply(&mut self, update: &ProductUpdate) {
        if update.product_id() != self.id {
            return;
        }
        match update {
            ProductUpdate::Refreshed {
                pricing,
                raw_snapshot,
                refreshed_at,
                ..
            } => {
                self.pricing = pricing.clone();
                self.raw_snapshot = Some(raw_snapshot.clone());
                self.last_refresh_at = Some(*refreshed_at);
            }
            ProductUpdate::Unavailable {
                last_available_at,
                refreshed_at,
                ..
            } => {
                self.status = ProductStatus::Unavailable;
                self.last_available_at = *last_available_at;
                self.last_refresh_at = Some(*refreshed_at);
            }
        }
    }
}

/// Write-back produced by one product refresh.
#[derive(Debug, Clone, PartialEq)]
pub enum ProductUpdate {
    Refreshed {
        product_id: ProductId,
        pricing: PricingSnapshot,
        raw_snapshot: serde_json::Value,
        refreshed_at: Timestamp,
    },
    Unavailable {
        product_id: ProductId,
        last_available_at: Option<Timestamp>,
        refreshed_at: Timestamp,
    },
}

impl ProductUpdate {
    pub fn product_id(&self) -> ProductId {
        match self {
            ProductUpdate::Refreshed { product_id, .. }
            | ProductUpdate::Unavailable { product_id, .. } => *product_id,
        }
    }

    pub fn refreshed_at(&self) -> Timestamp {
        match self {
            ProductUpdate::Refreshed { refreshed_at, .. }
            | ProductUpdate::Unavailable { refreshed_at, .. } => *refreshed_at,
        }
    }
}

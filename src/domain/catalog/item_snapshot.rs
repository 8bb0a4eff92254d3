//! Normalized item data returned by the upstream product API.

use serde::{Deserialize, Serialize};

use super::ItemId;

/// One image size variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageVariant {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Primary image of an item by size variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemImages {
    pub small: Option<ImageVariant>,
    pub medium: Option<ImageVariant>,
    pub large: Option<ImageVariant>,
}

/// Availability descriptor of the winning listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Availability {
    /// Upstream availability type (e.g. `Now`, `Backorder`).
    pub availability_type: Option<String>,
    /// Human-readable message (e.g. `In Stock.`).
    pub message: Option<String>,
}

/// Structured data for one item present in an upstream response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub item_id: ItemId,
    pub title: Option<String>,
    pub brand: Option<String>,
    pub detail_page_url: Option<String>,
    pub images: ItemImages,
    /// Current listing price.
    pub listing_price: Option<f64>,
    /// Original / savings-basis price.
    pub savings_basis_price: Option<f64>,
    pub currency: Option<String>,
    pub availability: Availability,
    pub review_count: Option<u32>,
    pub star_rating: Option<f64>,
    /// The upstream item object as received, kept for debugging.
    pub raw: serde_json::Value,
}

impl ItemSnapshot {
    /// Creates an empty snapshot for the given item.
    pub fn new(item_id: ItemId) -> Self {
        Self {
            item_id,
            title: None,
            brand: None,
            detail_page_url: None,
            images: ItemImages::default(),
            listing_price: None,
            savings_basis_price: None,
            currency: None,
            availability: Availability::default(),
            review_count: None,
            star_rating: None,
            raw: serde_json::Value::Null,
        }
    }

    /// Sets listing and savings-basis prices.
    pub fn with_prices(mut self, listing: Option<f64>, savings_basis: Option<f64>) -> Self {
        self.listing_price = listing;
        self.savings_basis_price = savings_basis;
        self
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the availability descriptor.
    pub fn with_availability(
        mut self,
        availability_type: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.availability = Availability {
            availability_type: Some(availability_type.into()),
            message: Some(message.into()),
        };
        self
    }

    /// Sets review count and star rating.
    pub fn with_reviews(mut self, count: u32, rating: f64) -> Self {
        self.review_count = Some(count);
        self.star_rating = Some(rating);
        self
    }
}

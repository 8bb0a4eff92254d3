//! Catalog module - Products, item identifiers and pricing.

mod item_id;
mod item_snapshot;
mod pricing;
mod product;
mod product_status;
mod staleness;

pub use item_id::{ItemId, ITEM_ID_LEN};
pub use item_snapshot::{Availability, ImageVariant, ItemImages, ItemSnapshot};
pub use pricing::{compute_savings, round_to_cents, PricingSnapshot, Savings};
pub use product::{Product, ProductUpdate};
pub use product_status::ProductStatus;
pub use staleness::StaleProductQuery;

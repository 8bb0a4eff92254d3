//! Refresh handlers.

mod refresh_products;

pub use refresh_products::{
    RefreshProductsCommand, RefreshProductsHandler, RefreshProductsResult, RefreshSettings,
};

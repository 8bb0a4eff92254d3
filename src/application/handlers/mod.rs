//! Command handlers.

pub mod refresh;

pub use refresh::{
    RefreshProductsCommand, RefreshProductsHandler, RefreshProductsResult, RefreshSettings,
};

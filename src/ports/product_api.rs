//! Product API Port - Interface for the upstream product-data service.
//!
//! Abstracts item lookup and keyword search so the refresh worker can be
//! driven by the live PA-API client or a scripted mock.
//!
//! Responses are closed tagged variants: each requested id is either
//! [`ItemLookup::Found`] or [`ItemLookup::Absent`], and failures are an
//! [`ApiError`] variant. The worker branches on these, never on raw JSON.

use async_trait::async_trait;
use std::collections::HashMap;

use super::CircuitState;
use crate::domain::catalog::{ItemId, ItemSnapshot};
use crate::domain::foundation::{DomainError, ErrorCode, ErrorKind};

/// Most ids a single lookup may carry.
pub const MAX_ITEM_IDS: usize = 10;

/// Most results a single search may return.
pub const MAX_SEARCH_RESULTS: u32 = 10;

/// Resources requested when refreshing a product.
pub const DEFAULT_RESOURCES: &[&str] = &[
    "ItemInfo.Title",
    "ItemInfo.ByLineInfo",
    "Images.Primary.Small",
    "Images.Primary.Medium",
    "Images.Primary.Large",
    "Offers.Listings.Price",
    "Offers.Listings.SavingBasis",
    "Offers.Listings.Availability.Type",
    "Offers.Listings.Availability.Message",
    "CustomerReviews.Count",
    "CustomerReviews.StarRating",
];

/// Port for upstream product-data lookups.
#[async_trait]
pub trait ProductApi: Send + Sync {
    /// Fetch items by identifier.
    async fn get_items(&self, request: &GetItemsRequest) -> Result<ItemsLookup, ApiError>;

    /// Search items by keywords.
    async fn search_items(&self, request: &SearchItemsRequest)
        -> Result<Vec<ItemSnapshot>, ApiError>;

    /// State of the breaker guarding this dependency.
    fn circuit_state(&self) -> CircuitState;
}

/// Lookup of up to ten items by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetItemsRequest {
    pub item_ids: Vec<ItemId>,
    pub resources: Vec<String>,
}

impl GetItemsRequest {
    /// Creates a request for the default refresh resources.
    pub fn new(item_ids: Vec<ItemId>) -> Self {
        Self {
            item_ids,
            resources: default_resources(),
        }
    }

    /// Creates a request for a single item.
    pub fn single(item_id: ItemId) -> Self {
        Self::new(vec![item_id])
    }

    /// Replaces the requested resources.
    pub fn with_resources(mut self, resources: Vec<String>) -> Self {
        self.resources = resources;
        self
    }

    /// Validates the request shape before anything goes on the wire.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.item_ids.is_empty() {
            return Err(ApiError::InvalidRequest("at least one item id is required".into()));
        }
        if self.item_ids.len() > MAX_ITEM_IDS {
            return Err(ApiError::InvalidRequest(format!(
                "at most {} item ids per request, got {}",
                MAX_ITEM_IDS,
                self.item_ids.len()
            )));
        }
        Ok(())
    }
}

/// Keyword search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchItemsRequest {
    pub keywords: String,
    pub search_index: Option<String>,
    pub item_count: u32,
    pub resources: Vec<String>,
}

impl SearchItemsRequest {
    pub fn new(keywords: impl Into<String>) -> Self {
        Self {
            keywords: keywords.into(),
            search_index: None,
            item_count: MAX_SEARCH_RESULTS,
            resources: default_resources(),
        }
    }

    pub fn with_search_index(mut self, index: impl Into<String>) -> Self {
        self.search_index = Some(index.into());
        self
    }

    pub fn with_item_count(mut self, count: u32) -> Self {
        self.item_count = count;
        self
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.keywords.trim().is_empty() {
            return Err(ApiError::InvalidRequest("keywords cannot be empty".into()));
        }
        if !(1..=MAX_SEARCH_RESULTS).contains(&self.item_count) {
            return Err(ApiError::InvalidRequest(format!(
                "item count must be between 1 and {}, got {}",
                MAX_SEARCH_RESULTS, self.item_count
            )));
        }
        Ok(())
    }
}

fn default_resources() -> Vec<String> {
    DEFAULT_RESOURCES.iter().map(|r| r.to_string()).collect()
}

/// Outcome for one requested id.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemLookup {
    Found(ItemSnapshot),
    /// The upstream answered without this item. It is no longer listed.
    Absent,
}

/// Per-id outcomes of a lookup, in request order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemsLookup {
    items: Vec<(ItemId, ItemLookup)>,
}

impl ItemsLookup {
    /// Builds the lookup for `requested` ids from the items actually returned.
    pub fn from_found(requested: &[ItemId], found: Vec<ItemSnapshot>) -> Self {
        let mut by_id: HashMap<ItemId, ItemSnapshot> = found
            .into_iter()
            .map(|item| (item.item_id.clone(), item))
            .collect();
        let items = requested
            .iter()
            .map(|id| {
                let lookup = match by_id.remove(id) {
                    Some(item) => ItemLookup::Found(item),
                    None => ItemLookup::Absent,
                };
                (id.clone(), lookup)
            })
            .collect();
        Self { items }
    }

    pub fn get(&self, id: &ItemId) -> ItemLookup {
        self.items
            .iter()
            .find(|(item_id, _)| item_id == id)
            .map(|(_, lookup)| lookup.clone())
            .unwrap_or(ItemLookup::Absent)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(ItemId, ItemLookup)> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Product API errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// The item is not accessible through the API (delisted or restricted).
    #[error("item not accessible: {message}")]
    ItemNotAccessible { code: String, message: String },

    /// A request parameter (usually the item id) was rejected.
    #[error("invalid parameter: {message}")]
    InvalidParameter { code: String, message: String },

    /// Throttled by the upstream.
    #[error("throttled: {message}")]
    Throttled { code: String, message: String },

    /// Credentials, signature or partner tag rejected.
    #[error("invalid credentials: {message}")]
    InvalidCredentials { code: String, message: String },

    /// Request timed out.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Any other upstream failure.
    #[error("upstream error (status {status}): {message}")]
    Upstream {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// Failed to parse upstream response.
    #[error("parse error: {0}")]
    Parse(String),

    /// The breaker rejected the call without sending it.
    #[error("circuit breaker open: retry after {retry_after_ms}ms")]
    CircuitOpen { retry_after_ms: u64 },

    /// Request failed local validation.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Internal error code for this error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            ApiError::ItemNotAccessible { .. } => ErrorCode::ItemNotAccessible,
            ApiError::InvalidParameter { .. } => ErrorCode::InvalidParameter,
            ApiError::Throttled { .. } => ErrorCode::Throttled,
            ApiError::InvalidCredentials { .. } => ErrorCode::InvalidCredentials,
            ApiError::Timeout { .. } => ErrorCode::UpstreamTimeout,
            ApiError::Upstream { .. } | ApiError::Parse(_) => ErrorCode::UpstreamError,
            ApiError::Network(_) => ErrorCode::NetworkError,
            ApiError::CircuitOpen { .. } => ErrorCode::CircuitOpen,
            ApiError::InvalidRequest(_) => ErrorCode::ValidationFailed,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.error_code().kind()
    }

    /// Returns true if another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::UpstreamTransient
    }

    /// Returns true if the item should be marked unavailable.
    pub fn marks_unavailable(&self) -> bool {
        self.kind() == ErrorKind::UpstreamItem
    }

    /// Returns true if this error means the dependency itself misbehaved.
    ///
    /// Item-level errors are correct answers and do not count.
    pub fn counts_as_breaker_failure(&self) -> bool {
        self.is_retryable()
    }

    /// Upstream error code, when the upstream sent one.
    pub fn upstream_code(&self) -> Option<&str> {
        match self {
            ApiError::ItemNotAccessible { code, .. }
            | ApiError::InvalidParameter { code, .. }
            | ApiError::Throttled { code, .. }
            | ApiError::InvalidCredentials { code, .. } => Some(code),
            ApiError::Upstream { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

impl From<ApiError> for DomainError {
    fn from(err: ApiError) -> Self {
        let upstream_code = err.upstream_code().map(str::to_string);
        let mut domain = DomainError::new(err.error_code(), err.to_string());
        if let Some(code) = upstream_code {
            domain = domain.with_detail("upstream_code", code);
        }
        domain
    }
}

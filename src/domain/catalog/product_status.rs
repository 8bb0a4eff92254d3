//! ProductStatus enum for the catalog lifecycle of a product.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Lifecycle status of a catalog product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    #[default]
    Active,
    Draft,
    Unavailable,
}

impl ProductStatus {
    /// Statuses the refresh worker selects from.
    pub const REFRESHABLE: [ProductStatus; 2] = [ProductStatus::Active, ProductStatus::Draft];

    /// Returns true if the refresh worker should pick this product up.
    pub fn is_refreshable(&self) -> bool {
        Self::REFRESHABLE.contains(self)
    }

    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Draft => "draft",
            ProductStatus::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ProductStatus::Active),
            "draft" => Ok(ProductStatus::Draft),
            "unavailable" => Ok(ProductStatus::Unavailable),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown product status '{}'", other),
            )),
        }
    }
}

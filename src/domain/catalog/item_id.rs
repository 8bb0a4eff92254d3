//! Marketplace item identifier (ASIN).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Required length of a marketplace item identifier.
pub const ITEM_ID_LEN: usize = 10;

/// A marketplace-scoped item identifier: exactly ten ASCII alphanumerics,
/// stored upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemId(String);

impl ItemId {
    /// Validates and normalises an identifier.
    pub fn new(value: impl AsRef<str>) -> Result<Self, ValidationError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("item_id"));
        }
        if trimmed.len() != ITEM_ID_LEN {
            return Err(ValidationError::invalid_format(
                "item_id",
                format!("expected {} characters, got {}", ITEM_ID_LEN, trimmed.len()),
            ));
        }
        if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ValidationError::invalid_format(
                "item_id",
                "only ASCII letters and digits are allowed",
            ));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ItemId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ItemId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ten_alphanumerics() {
        let id = ItemId::new("B08N5WRWNW").unwrap();
        assert_eq!(id.as_str(), "B08N5WRWNW");
    }

    #[test]
    fn normalises_to_upper_case() {
        assert_eq!(ItemId::new("b08n5wrwnw").unwrap().as_str(), "B08N5WRWNW");
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(ItemId::new("B08N5WRWN").is_err());
        assert!(ItemId::new("B08N5WRWNWX").is_err());
    }

    #[test]
    fn rejects_punctuation() {
        assert!(matches!(
            ItemId::new("B08N5-RWNW"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(
            ItemId::new("   "),
            Err(ValidationError::EmptyField { .. })
        ));
    }

    #[test]
    fn deserialization_validates() {
        assert!(serde_json::from_str::<ItemId>("\"B08N5WRWNW\"").is_ok());
        assert!(serde_json::from_str::<ItemId>("\"short\"").is_err());
    }
}

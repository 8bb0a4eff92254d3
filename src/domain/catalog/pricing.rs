//! Pricing snapshot and derived savings.

use serde::{Deserialize, Serialize};

use super::ItemSnapshot;

/// Rounds a monetary or percentage value to two decimal places.
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Savings derived from a current and an original price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Savings {
    pub amount: f64,
    pub percentage: f64,
}

/// Computes savings when both prices are known and the current price is
/// strictly below the original. Both values are rounded to two decimals.
pub fn compute_savings(current: Option<f64>, original: Option<f64>) -> Option<Savings> {
    let (current, original) = (current?, original?);
    if !(current < original) || original <= 0.0 {
        return None;
    }
    let amount = original - current;
    Some(Savings {
        amount: round_to_cents(amount),
        percentage: round_to_cents(amount / original * 100.0),
    })
}

/// Refresh-derived pricing, availability and review fields of a product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingSnapshot {
    pub current_price: Option<f64>,
    pub original_price: Option<f64>,
    pub currency: Option<String>,
    pub savings_amount: Option<f64>,
    pub savings_percentage: Option<f64>,
    pub availability_type: Option<String>,
    pub availability_message: Option<String>,
    pub review_count: Option<u32>,
    pub star_rating: Option<f64>,
}

impl PricingSnapshot {
    /// Builds the snapshot written back to the product from fetched item data.
    pub fn from_item(item: &ItemSnapshot) -> Self {
        let savings = compute_savings(item.listing_price, item.savings_basis_price);
        Self {
            current_price: item.listing_price,
            original_price: item.savings_basis_price,
            currency: item.currency.clone(),
            savings_amount: savings.map(|s| s.amount),
            savings_percentage: savings.map(|s| s.percentage),
            availability_type: item.availability.availability_type.clone(),
            availability_message: item.availability.message.clone(),
            review_count: item.review_count,
            star_rating: item.star_rating,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::ItemId;
    use proptest::prelude::*;

    #[test]
    fn savings_for_discounted_item() {
        let savings = compute_savings(Some(17.99), Some(24.99)).unwrap();
        assert_eq!(savings.amount, 7.00);
        assert_eq!(savings.percentage, 28.01);
    }

    #[test]
    fn no_savings_when_price_not_lower() {
        assert_eq!(compute_savings(Some(24.99), Some(24.99)), None);
        assert_eq!(compute_savings(Some(30.00), Some(24.99)), None);
    }

    #[test]
    fn no_savings_when_a_price_is_missing() {
        assert_eq!(compute_savings(None, Some(24.99)), None);
        assert_eq!(compute_savings(Some(17.99), None), None);
    }

    #[test]
    fn snapshot_from_item_copies_fields_and_derives_savings() {
        let item = ItemSnapshot::new(ItemId::new("B000000001").unwrap())
            .with_prices(Some(17.99), Some(24.99))
            .with_availability("Now", "In Stock.")
            .with_reviews(1200, 4.6);

        let snapshot = PricingSnapshot::from_item(&item);

        assert_eq!(snapshot.current_price, Some(17.99));
        assert_eq!(snapshot.original_price, Some(24.99));
        assert_eq!(snapshot.savings_amount, Some(7.00));
        assert_eq!(snapshot.savings_percentage, Some(28.01));
        assert_eq!(snapshot.availability_type.as_deref(), Some("Now"));
        assert_eq!(snapshot.availability_message.as_deref(), Some("In Stock."));
        assert_eq!(snapshot.review_count, Some(1200));
        assert_eq!(snapshot.star_rating, Some(4.6));
    }

    #[test]
    fn snapshot_without_discount_has_null_savings() {
        let item = ItemSnapshot::new(ItemId::new("B000000001").unwrap())
            .with_prices(Some(24.99), Some(19.99));

        let snapshot = PricingSnapshot::from_item(&item);

        assert_eq!(snapshot.savings_amount, None);
        assert_eq!(snapshot.savings_percentage, None);
    }

    proptest! {
        #[test]
        fn savings_are_bounded(current in 0.01f64..10_000.0, original in 0.01f64..10_000.0) {
            match compute_savings(Some(current), Some(original)) {
                Some(s) => {
                    prop_assert!(current < original);
                    prop_assert!(s.amount >= 0.0);
                    prop_assert!(s.amount <= round_to_cents(original));
                    prop_assert!((0.0..=100.0).contains(&s.percentage));
                }
                None => prop_assert!(current >= original),
            }
        }
    }
}

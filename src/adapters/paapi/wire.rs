//! PA-API 5.0 wire types.

use serde::{Deserialize, Serialize};

use crate::domain::catalog::{Availability, ImageVariant, ItemId, ItemImages, ItemSnapshot};
use crate::ports::ApiError;

/// Partner type sent with every request.
pub const PARTNER_TYPE: &str = "Associates";

// ════════════════════════════════════════════════════════════════════════════════
// Requests
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetItemsBody<'a> {
    pub item_ids: Vec<&'a str>,
    pub item_id_type: &'static str,
    pub resources: &'a [String],
    pub partner_tag: &'a str,
    pub partner_type: &'static str,
    pub marketplace: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SearchItemsBody<'a> {
    pub keywords: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_index: Option<&'a str>,
    pub item_count: u32,
    pub resources: &'a [String],
    pub partner_tag: &'a str,
    pub partner_type: &'static str,
    pub marketplace: &'a str,
}

// ════════════════════════════════════════════════════════════════════════════════
// Responses
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "Errors", default)]
    pub errors: Vec<WireError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireError {
    #[serde(rename = "Code", default)]
    pub code: String,
    #[serde(rename = "Message", default)]
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WireItem {
    #[serde(rename = "ASIN")]
    pub asin: String,
    #[serde(rename = "DetailPageURL")]
    pub detail_page_url: Option<String>,
    pub item_info: Option<ItemInfo>,
    pub images: Option<Images>,
    pub offers: Option<Offers>,
    pub customer_reviews: Option<CustomerReviews>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemInfo {
    pub title: Option<DisplayValue<String>>,
    pub by_line_info: Option<ByLineInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ByLineInfo {
    pub brand: Option<DisplayValue<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DisplayValue<T> {
    pub display_value: T,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Images {
    pub primary: Option<ImageSet>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageSet {
    pub small: Option<WireImage>,
    pub medium: Option<WireImage>,
    pub large: Option<WireImage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WireImage {
    #[serde(rename = "URL")]
    pub url: String,
    pub height: Option<u32>,
    pub width: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Offers {
    #[serde(default)]
    pub listings: Vec<Listing>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Listing {
    pub price: Option<Price>,
    pub saving_basis: Option<Price>,
    pub availability: Option<WireAvailability>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Price {
    pub amount: Option<f64>,
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WireAvailability {
    #[serde(rename = "Type")]
    pub availability_type: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomerReviews {
    pub count: Option<u32>,
    pub star_rating: Option<StarRating>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StarRating {
    pub value: Option<f64>,
}

/// Errors and raw item objects pulled out of a response body.
#[derive(Debug, Default)]
pub struct ResponseParts {
    pub items: Vec<serde_json::Value>,
    pub errors: Vec<WireError>,
}

impl ResponseParts {
    /// Splits a body under `result_key` (`ItemsResult` or `SearchResult`).
    pub fn from_body(body: &serde_json::Value, result_key: &str) -> Self {
        let items = body
            .get(result_key)
            .and_then(|r| r.get("Items"))
            .and_then(|i| i.as_array())
            .cloned()
            .unwrap_or_default();
        let errors = body
            .get("Errors")
            .cloned()
            .and_then(|e| serde_json::from_value::<Vec<WireError>>(e).ok())
            .unwrap_or_default();
        Self { items, errors }
    }
}

/// Normalizes one raw item object.
///
/// Returns `Ok(None)` if the object carries no valid ASIN and so cannot be
/// matched to a requested item. An item with a valid ASIN whose fields do
/// not deserialize is a `Parse` error, never a missing item.
pub fn to_snapshot(raw: serde_json::Value) -> Result<Option<ItemSnapshot>, ApiError> {
    let Some(item_id) = raw
        .get("ASIN")
        .and_then(|a| a.as_str())
        .and_then(|a| ItemId::new(a).ok())
    else {
        return Ok(None);
    };
    let item: WireItem = serde_json::from_value(raw.clone()).map_err(|e| {
        ApiError::Parse(format!("Failed to parse item {}: {}", item_id, e))
    })?;

    let listing = item.offers.and_then(|o| o.listings.into_iter().next());
    let (price, saving_basis, availability) = match listing {
        Some(l) => (l.price, l.saving_basis, l.availability),
        None => (None, None, None),
    };
    let currency = price
        .as_ref()
        .and_then(|p| p.currency.clone())
        .or_else(|| saving_basis.as_ref().and_then(|p| p.currency.clone()));

    let info = item.item_info.unwrap_or_default();
    let primary = item.images.and_then(|i| i.primary).unwrap_or_default();
    let reviews = item.customer_reviews.unwrap_or_default();

    Ok(Some(ItemSnapshot {
        item_id,
        title: info.title.map(|t| t.display_value),
        brand: info
            .by_line_info
            .and_then(|b| b.brand)
            .map(|b| b.display_value),
        detail_page_url: item.detail_page_url,
        images: ItemImages {
            small: primary.small.map(to_variant),
            medium: primary.medium.map(to_variant),
            large: primary.large.map(to_variant),
        },
        listing_price: price.and_then(|p| p.amount),
        savings_basis_price: saving_basis.and_then(|p| p.amount),
        currency,
        availability: availability
            .map(|a| Availability {
                availability_type: a.availability_type,
                message: a.message,
            })
            .unwrap_or_default(),
        review_count: reviews.count,
        star_rating: reviews.star_rating.and_then(|s| s.value),
        raw,
    }))
}

/// Normalizes every raw item, failing on the first malformed one.
pub fn to_snapshots(items: Vec<serde_json::Value>) -> Result<Vec<ItemSnapshot>, ApiError> {
    let mut snapshots = Vec::with_capacity(items.len());
    for raw in items {
        if let Some(snapshot) = to_snapshot(raw)? {
            snapshots.push(snapshot);
        }
    }
    Ok(snapshots)
}

fn to_variant(image: WireImage) -> ImageVariant {
    ImageVariant {
        url: image.url,
        width: image.width,
        height: image.height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_item() -> serde_json::Value {
        json!({
            "ASIN": "B08N5WRWNW",
            "DetailPageURL": "https://www.amazon.com/dp/B08N5WRWNW?tag=store-20",
            "ItemInfo": {
                "Title": { "DisplayValue": "Electric Kettle", "Label": "Title" },
                "ByLineInfo": { "Brand": { "DisplayValue": "Acme" } }
            },
            "Images": {
                "Primary": {
                    "Small": { "URL": "https://m.media-amazon.com/s.jpg", "Height": 75, "Width": 75 },
                    "Large": { "URL": "https://m.media-amazon.com/l.jpg", "Height": 500, "Width": 500 }
                }
            },
            "Offers": {
                "Listings": [{
                    "Price": { "Amount": 17.99, "Currency": "USD", "DisplayAmount": "$17.99" },
                    "SavingBasis": { "Amount": 24.99, "Currency": "USD" },
                    "Availability": { "Type": "Now", "Message": "In Stock." }
                }]
            },
            "CustomerReviews": { "Count": 1523, "StarRating": { "Value": 4.6 } }
        })
    }

    #[test]
    fn get_items_body_uses_pascal_case() {
        let resources = vec!["ItemInfo.Title".to_string()];
        let body = GetItemsBody {
            item_ids: vec!["B08N5WRWNW"],
            item_id_type: "ASIN",
            resources: &resources,
            partner_tag: "store-20",
            partner_type: PARTNER_TYPE,
            marketplace: "www.amazon.com",
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            json!({
                "ItemIds": ["B08N5WRWNW"],
                "ItemIdType": "ASIN",
                "Resources": ["ItemInfo.Title"],
                "PartnerTag": "store-20",
                "PartnerType": "Associates",
                "Marketplace": "www.amazon.com"
            })
        );
    }

    #[test]
    fn search_body_omits_missing_index() {
        let resources: Vec<String> = vec![];
        let body = SearchItemsBody {
            keywords: "kettle",
            search_index: None,
            item_count: 5,
            resources: &resources,
            partner_tag: "store-20",
            partner_type: PARTNER_TYPE,
            marketplace: "www.amazon.com",
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("SearchIndex").is_none());
        assert_eq!(value["ItemCount"], 5);
    }

    #[test]
    fn full_item_normalizes() {
        let snapshot = to_snapshot(full_item()).unwrap().unwrap();

        assert_eq!(snapshot.item_id.as_str(), "B08N5WRWNW");
        assert_eq!(snapshot.title.as_deref(), Some("Electric Kettle"));
        assert_eq!(snapshot.brand.as_deref(), Some("Acme"));
        assert_eq!(snapshot.listing_price, Some(17.99));
        assert_eq!(snapshot.savings_basis_price, Some(24.99));
        assert_eq!(snapshot.currency.as_deref(), Some("USD"));
        assert_eq!(snapshot.availability.availability_type.as_deref(), Some("Now"));
        assert_eq!(snapshot.availability.message.as_deref(), Some("In Stock."));
        assert_eq!(snapshot.review_count, Some(1523));
        assert_eq!(snapshot.star_rating, Some(4.6));
        assert_eq!(snapshot.images.small.as_ref().unwrap().width, Some(75));
        assert!(snapshot.images.medium.is_none());
        assert_eq!(snapshot.raw["ASIN"], "B08N5WRWNW");
    }

    #[test]
    fn sparse_item_normalizes_to_nones() {
        let snapshot = to_snapshot(json!({ "ASIN": "B08N5WRWNW" })).unwrap().unwrap();
        assert!(snapshot.title.is_none());
        assert!(snapshot.listing_price.is_none());
        assert!(snapshot.availability.availability_type.is_none());
    }

    #[test]
    fn item_without_valid_asin_is_dropped() {
        assert!(to_snapshot(json!({ "ASIN": "bad" })).unwrap().is_none());
        assert!(to_snapshot(json!({ "Title": "x" })).unwrap().is_none());
    }

    #[test]
    fn malformed_field_on_a_listed_item_is_a_parse_error() {
        let mut raw = full_item();
        raw["CustomerReviews"]["StarRating"]["Value"] = json!("4.6");

        let err = to_snapshot(raw).unwrap_err();

        assert!(matches!(err, ApiError::Parse(ref msg) if msg.contains("B08N5WRWNW")));
        assert!(err.is_retryable());
        assert!(!err.marks_unavailable());
    }

    #[test]
    fn one_malformed_item_fails_the_whole_lookup() {
        let mut bad = full_item();
        bad["ASIN"] = json!("B000000002");
        bad["Images"]["Primary"]["Small"]["Height"] = json!("tall");

        let result = to_snapshots(vec![full_item(), bad]);

        assert!(matches!(result, Err(ApiError::Parse(_))));
        assert_eq!(to_snapshots(vec![full_item(), json!({})]).unwrap().len(), 1);
    }

    #[test]
    fn response_parts_split_items_and_errors() {
        let body = json!({
            "ItemsResult": { "Items": [full_item()] },
            "Errors": [{ "Code": "ItemNotAccessible", "Message": "B000000002 not accessible" }]
        });
        let parts = ResponseParts::from_body(&body, "ItemsResult");
        assert_eq!(parts.items.len(), 1);
        assert_eq!(parts.errors[0].code, "ItemNotAccessible");
    }
}

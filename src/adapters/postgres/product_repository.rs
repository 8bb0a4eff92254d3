//! PostgreSQL implementation of ProductRepository.
//!
//! Reads and writes the catalog's `products` table. Only the refresh-derived
//! columns are ever updated.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::catalog::{ItemId, PricingSnapshot, Product, ProductStatus, ProductUpdate, StaleProductQuery};
use crate::domain::foundation::{DomainError, ErrorCode, ProductId, Timestamp, ValidationError};
use crate::ports::ProductRepository;

/// PostgreSQL implementation of ProductRepository.
#[derive(Clone)]
pub struct PostgresProductRepository {
    pool: PgPool,
}

impl PostgresProductRepository {
    /// Creates a new PostgresProductRepository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for PostgresProductRepository {
    async fn find_stale(&self, query: &StaleProductQuery) -> Result<Vec<Product>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, asin, status, last_refresh_at, last_available_at,
                   current_price, original_price, currency,
                   savings_amount, savings_percentage,
                   availability_type, availability_message,
                   review_count, star_rating, raw_api_response
            FROM products
            WHERE status IN ('active', 'draft')
              AND (last_refresh_at IS NULL OR last_refresh_at < $1)
              AND btrim(asin) ~ '^[A-Za-z0-9]{10}$'
            ORDER BY last_refresh_at ASC NULLS FIRST
            LIMIT $2
            "#,
        )
        .bind(query.stale_before.as_datetime())
        .bind(query.limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to select stale products: {}", e),
            )
        })?;

        let rows = rows
            .into_iter()
            .map(read_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(valid_products(rows))
    }

    async fn apply_update(&self, update: &ProductUpdate) -> Result<(), DomainError> {
        let result = match update {
            ProductUpdate::Refreshed {
                product_id,
                pricing,
                raw_snapshot,
                refreshed_at,
            } => {
                sqlx::query(
                    r#"
                    UPDATE products SET
                        current_price = $2,
                        original_price = $3,
                        currency = $4,
                        savings_amount = $5,
                        savings_percentage = $6,
                        availability_type = $7,
                        availability_message = $8,
                        review_count = $9,
                        star_rating = $10,
                        raw_api_response = $11,
                        last_refresh_at = $12
                    WHERE id = $1
                    "#,
                )
                .bind(product_id.as_uuid())
                .bind(pricing.current_price)
                .bind(pricing.original_price)
                .bind(pricing.currency.as_deref())
                .bind(pricing.savings_amount)
                .bind(pricing.savings_percentage)
                .bind(pricing.availability_type.as_deref())
                .bind(pricing.availability_message.as_deref())
                .bind(review_count_column(pricing.review_count))
                .bind(pricing.star_rating)
                .bind(raw_snapshot)
                .bind(refreshed_at.as_datetime())
                .execute(&self.pool)
                .await
            }
            ProductUpdate::Unavailable {
                product_id,
                last_available_at,
                refreshed_at,
            } => {
                sqlx::query(
                    r#"
                    UPDATE products SET
                        status = 'unavailable',
                        last_available_at = $2,
                        last_refresh_at = $3
                    WHERE id = $1
                    "#,
                )
                .bind(product_id.as_uuid())
                .bind(last_available_at.map(|t| *t.as_datetime()))
                .bind(refreshed_at.as_datetime())
                .execute(&self.pool)
                .await
            }
        }
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to update product: {}", e),
            )
        })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                format!("Product not found: {}", update.product_id()),
            ));
        }

        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Row mapping
// ════════════════════════════════════════════════════════════════════════════

fn column_error(column: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Failed to get {}: {}", column, e),
    )
}

/// `review_count` is an INTEGER column; counts it cannot hold are stored as NULL.
fn review_count_column(count: Option<u32>) -> Option<i32> {
    count.and_then(|c| i32::try_from(c).ok())
}

/// Raw column values of one selected row, before domain validation.
#[derive(Debug, Clone)]
struct ProductRow {
    id: uuid::Uuid,
    asin: String,
    status: String,
    last_refresh_at: Option<chrono::DateTime<chrono::Utc>>,
    last_available_at: Option<chrono::DateTime<chrono::Utc>>,
    pricing: PricingSnapshot,
    raw_snapshot: Option<serde_json::Value>,
}

impl ProductRow {
    fn into_product(self) -> Result<Product, ValidationError> {
        Ok(Product {
            id: ProductId::from_uuid(self.id),
            item_id: ItemId::new(&self.asin)?,
            status: self.status.parse::<ProductStatus>()?,
            last_refresh_at: self.last_refresh_at.map(Timestamp::from_datetime),
            last_available_at: self.last_available_at.map(Timestamp::from_datetime),
            pricing: self.pricing,
            raw_snapshot: self.raw_snapshot,
        })
    }
}

/// Converts selected rows. Rows that fail validation are logged and dropped.
fn valid_products(rows: Vec<ProductRow>) -> Vec<Product> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id;
            let asin = row.asin.clone();
            match row.into_product() {
                Ok(product) => Some(product),
                Err(e) => {
                    tracing::warn!(
                        product_id = %id,
                        asin = %asin,
                        error = %e,
                        "Skipping product row that cannot be refreshed"
                    );
                    None
                }
            }
        })
        .collect()
}

fn read_row(row: sqlx::postgres::PgRow) -> Result<ProductRow, DomainError> {
    let review_count: Option<i32> = row
        .try_get("review_count")
        .map_err(|e| column_error("review_count", e))?;

    let pricing = PricingSnapshot {
        current_price: row
            .try_get("current_price")
            .map_err(|e| column_error("current_price", e))?,
        original_price: row
            .try_get("original_price")
            .map_err(|e| column_error("original_price", e))?,
        currency: row
            .try_get("currency")
            .map_err(|e| column_error("currency", e))?,
        savings_amount: row
            .try_get("savings_amount")
            .map_err(|e| column_error("savings_amount", e))?,
        savings_percentage: row
            .try_get("savings_percentage")
            .map_err(|e| column_error("savings_percentage", e))?,
        availability_type: row
            .try_get("availability_type")
            .map_err(|e| column_error("availability_type", e))?,
        availability_message: row
            .try_get("availability_message")
            .map_err(|e| column_error("availability_message", e))?,
        review_count: review_count.and_then(|c| u32::try_from(c).ok()),
        star_rating: row
            .try_get("star_rating")
            .map_err(|e| column_error("star_rating", e))?,
    };

    Ok(ProductRow {
        id: row.try_get("id").map_err(|e| column_error("id", e))?,
        asin: row.try_get("asin").map_err(|e| column_error("asin", e))?,
        status: row.try_get("status").map_err(|e| column_error("status", e))?,
        last_refresh_at: row
            .try_get("last_refresh_at")
            .map_err(|e| column_error("last_refresh_at", e))?,
        last_available_at: row
            .try_get("last_available_at")
            .map_err(|e| column_error("last_available_at", e))?,
        pricing,
        raw_snapshot: row
            .try_get("raw_api_response")
            .map_err(|e| column_error("raw_api_response", e))?,
    })
}

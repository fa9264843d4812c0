//! Catalog product types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stepup_core::{Money, ProductId};

/// A product in the catalog.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    /// Unique human-facing code, e.g. `SKU-1A2B3C4D`.
    pub code: String,
    pub name: String,
    pub description: String,
    pub brand: String,
    pub category: String,
    pub color: String,
    pub price: Money,
    /// Units on hand. Never negative.
    pub stock: i32,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether `quantity` units can be taken from stock.
    #[must_use]
    pub fn has_stock_for(&self, quantity: u32) -> bool {
        u32::try_from(self.stock).is_ok_and(|stock| stock >= quantity)
    }
}

/// Client payload for creating or updating a product.
///
/// Optional text fields default to empty. An empty or missing `image_url`
/// keeps the current image on update.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    #[serde(default)]
    pub code: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub color: String,
    pub price: Decimal,
    pub stock: i64,
    #[serde(default)]
    pub image_url: Option<String>,
}

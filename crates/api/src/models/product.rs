//! Catalog product.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use hexshop_core::{CategoryId, ProductId};

/// A product with its on-hand stock.
///
/// `quantity` is the only field the order workflow mutates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub short_description: String,
    pub description: String,
    /// Unit price.
    pub price: Decimal,
    /// Quantity on hand. Never negative.
    pub quantity: i32,
    pub category_id: CategoryId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Writable product fields, used for both create and full update.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub quantity: i32,
    pub category_id: CategoryId,
}

impl Product {
    /// Overwrite every writable field with `input`.
    pub fn apply(&mut self, input: ProductInput) {
        self.name = input.name;
        self.short_description = input.short_description;
        self.description = input.description;
        self.price = input.price;
        self.quantity = input.quantity;
        self.category_id = input.category_id;
    }
}

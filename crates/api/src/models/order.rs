//! Order domain types.
//!
//! An [`Order`] owns its [`OrderLine`]s. Lines are persisted as rows keyed by
//! `(order_id, product_id)` and are never shared between orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hexshop_core::{OrderId, OrderStatus, ProductId, UserId};

use super::User;

/// One product and quantity pairing on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: i32,
}

impl OrderLine {
    #[must_use]
    pub const fn new(product_id: ProductId, quantity: i32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// A persisted order with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    pub user_id: UserId,
    /// Owning user, when it could be loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(rename = "productItems")]
    pub lines: Vec<OrderLine>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A candidate order submitted for creation.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    /// Status sent by the caller. Creation always overrides it.
    pub status: Option<String>,
    pub lines: Vec<OrderLine>,
}

/// A status change request, optionally carrying revised lines.
#[derive(Debug, Clone)]
pub struct OrderStatusChange {
    pub id: OrderId,
    /// Raw status string, validated against [`OrderStatus`].
    pub status: String,
    pub lines: Vec<OrderLine>,
}

/// A validated order ready to be written by an order store.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub user_id: UserId,
    pub status: OrderStatus,
    pub lines: Vec<OrderLine>,
}

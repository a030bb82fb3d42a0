//! Order line repository.

use async_trait::async_trait;
use sqlx::PgPool;

use hexshop_core::{OrderId, ProductId};

use super::{RepositoryError, map_constraint};
use crate::models::OrderLine;
use crate::ports::OrderLineStore;

#[derive(Debug, sqlx::FromRow)]
struct OrderLineRow {
    product_id: i32,
    quantity: i32,
}

impl From<OrderLineRow> for OrderLine {
    fn from(row: OrderLineRow) -> Self {
        Self::new(ProductId::new(row.product_id), row.quantity)
    }
}

/// Repository for `hexshop.order_product` rows.
#[derive(Clone)]
pub struct OrderLineRepository {
    pool: PgPool,
}

impl OrderLineRepository {
    /// Create a new order line repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderLineStore for OrderLineRepository {
    async fn add(
        &self,
        order_id: OrderId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO hexshop.order_product (order_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(order_id)
        .bind(product_id)
        .bind(quantity)
        .execute(&self.pool)
        .await
        .map_err(|e| map_constraint(e, "order line already exists"))?;

        Ok(())
    }

    async fn get_products(&self, order_id: OrderId) -> Result<Vec<OrderLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderLineRow>(
            r"
            SELECT product_id, quantity
            FROM hexshop.order_product
            WHERE order_id = $1
            ORDER BY position
            ",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete_for_order(&self, order_id: OrderId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM hexshop.order_product WHERE order_id = $1")
            .bind(order_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

//! Order repository.
//!
//! Headers live in `hexshop.orders`; lines are written and read through the
//! nested [`OrderLineRepository`]. Reads hydrate the lines and, when it still
//! exists, the owning user.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use hexshop_core::{OrderId, OrderStatus, UserId};

use super::{OrderLineRepository, RepositoryError, UserRepository, map_constraint};
use crate::models::{Order, OrderDraft};
use crate::ports::{OrderLineStore, OrderStore, UserStore};

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    status: OrderStatus,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Repository for order headers and their lines.
#[derive(Clone)]
pub struct OrderRepository {
    pool: PgPool,
    lines: OrderLineRepository,
    users: UserRepository,
}

impl OrderRepository {
    /// Create a new order repository.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            lines: OrderLineRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            pool,
        }
    }

    async fn hydrate(&self, row: OrderRow) -> Result<Order, RepositoryError> {
        let id = OrderId::new(row.id);
        let user_id = UserId::new(row.user_id);
        let lines = self.lines.get_products(id).await?;
        let user = self.users.find_user_by_id(user_id).await?;

        Ok(Order {
            id,
            status: row.status,
            user_id,
            user,
            lines,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl OrderStore for OrderRepository {
    fn lines(&self) -> &dyn OrderLineStore {
        &self.lines
    }

    #[instrument(skip(self, draft), fields(user_id = %draft.user_id, lines = draft.lines.len()))]
    async fn create_order(&self, draft: &OrderDraft) -> Result<Order, RepositoryError> {
        if !draft.status.is_storable() {
            return Err(RepositoryError::DataCorruption(
                "refusing to store an empty order status".to_owned(),
            ));
        }

        let row = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO hexshop.orders (id, status, user_id)
            VALUES ($1, $2, $3)
            RETURNING id, status, user_id, created_at, updated_at
            ",
        )
        .bind(OrderId::generate())
        .bind(draft.status)
        .bind(draft.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_constraint(e, "order owner does not exist"))?;

        let id = OrderId::new(row.id);
        for line in &draft.lines {
            self.lines().add(id, line.product_id, line.quantity).await?;
        }

        self.hydrate(row).await
    }

    async fn find_order_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, status, user_id, created_at, updated_at
            FROM hexshop.orders
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        if !status.is_storable() {
            return Err(RepositoryError::DataCorruption(
                "refusing to store an empty order status".to_owned(),
            ));
        }

        let row = sqlx::query_as::<_, OrderRow>(
            r"
            UPDATE hexshop.orders
            SET status = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, status, user_id, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self), fields(order_id = %id))]
    async fn delete_order(&self, id: OrderId) -> Result<u64, RepositoryError> {
        let removed = self.lines().delete_for_order(id).await?;
        tracing::debug!(removed, "deleted order lines");

        let result = sqlx::query("DELETE FROM hexshop.orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

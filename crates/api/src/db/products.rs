//! Product repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use hexshop_core::{CategoryId, ProductId};

use super::{RepositoryError, map_constraint};
use crate::models::{Product, ProductInput};
use crate::ports::ProductStore;

/// Internal row type for product queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    short_description: String,
    description: String,
    price: Decimal,
    quantity: i32,
    category_id: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            short_description: row.short_description,
            description: row.description,
            price: row.price,
            quantity: row.quantity,
            category_id: CategoryId::new(row.category_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for product database operations.
#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for ProductRepository {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, short_description, description, price, quantity,
                   category_id, created_at, updated_at
            FROM hexshop.product
            ORDER BY id
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_product_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, short_description, description, price, quantity,
                   category_id, created_at, updated_at
            FROM hexshop.product
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn insert_product(&self, input: &ProductInput) -> Result<ProductId, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO hexshop.product
                (name, short_description, description, price, quantity, category_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            ",
        )
        .bind(&input.name)
        .bind(&input.short_description)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.quantity)
        .bind(input.category_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_constraint(e, "category does not exist"))?;

        Ok(ProductId::new(id))
    }

    async fn update_product(
        &self,
        product: &Product,
        id: ProductId,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE hexshop.product
            SET name = $2, short_description = $3, description = $4,
                price = $5, quantity = $6, category_id = $7, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&product.name)
        .bind(&product.short_description)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.quantity)
        .bind(product.category_id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_constraint(e, "category does not exist"))?;

        Ok(result.rows_affected())
    }

    async fn delete_product(&self, id: ProductId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM hexshop.product WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

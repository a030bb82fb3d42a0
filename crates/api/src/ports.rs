//! Store interfaces consumed by the services.
//!
//! Services depend on these traits only; [`crate::db`] provides a
//! `PostgreSQL` adapter and an in-memory adapter for each of them. Absence is
//! reported as `Ok(None)` (or zero rows affected), never as an error.

use async_trait::async_trait;

use hexshop_core::{CategoryId, Email, OrderId, OrderStatus, ProductId, UserId};

use crate::db::RepositoryError;
use crate::models::{
    Category, NewUser, Order, OrderDraft, OrderLine, Product, ProductInput, User,
};

/// Product persistence.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// List all products ordered by ID.
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError>;

    /// Look up a single product.
    async fn find_product_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Insert a product and return its new ID.
    async fn insert_product(&self, input: &ProductInput) -> Result<ProductId, RepositoryError>;

    /// Overwrite the product stored under `id` with `product`'s writable
    /// fields (quantity included) and bump `updated_at`.
    ///
    /// Returns the number of rows affected.
    async fn update_product(&self, product: &Product, id: ProductId)
    -> Result<u64, RepositoryError>;

    /// Delete a product. Returns the number of rows affected.
    async fn delete_product(&self, id: ProductId) -> Result<u64, RepositoryError>;
}

/// Category persistence.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;

    async fn find_category_by_id(
        &self,
        id: CategoryId,
    ) -> Result<Option<Category>, RepositoryError>;

    async fn insert_category(&self, name: &str) -> Result<CategoryId, RepositoryError>;

    /// Rename a category. Returns the number of rows affected.
    async fn update_category(&self, id: CategoryId, name: &str) -> Result<u64, RepositoryError>;

    /// Delete a category. Returns [`RepositoryError::Conflict`] while
    /// products still reference it.
    async fn delete_category(&self, id: CategoryId) -> Result<u64, RepositoryError>;
}

/// User persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. Returns [`RepositoryError::Conflict`] on duplicate email.
    async fn insert_user(&self, user: &NewUser) -> Result<User, RepositoryError>;

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// Get a user together with their password hash.
    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    /// Update name fields, returning the updated user.
    async fn update_profile(
        &self,
        id: UserId,
        first_name: &str,
        surname: &str,
    ) -> Result<Option<User>, RepositoryError>;
}

/// Order line persistence, nested inside an [`OrderStore`].
#[async_trait]
pub trait OrderLineStore: Send + Sync {
    /// Attach a line to an order.
    async fn add(
        &self,
        order_id: OrderId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError>;

    /// All lines of an order, in insertion order.
    async fn get_products(&self, order_id: OrderId) -> Result<Vec<OrderLine>, RepositoryError>;

    /// Remove every line of an order. Returns the number of rows removed.
    async fn delete_for_order(&self, order_id: OrderId) -> Result<u64, RepositoryError>;
}

/// Order header persistence.
///
/// Implementations write lines through [`OrderStore::lines`] and hydrate the
/// owning user on reads.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// The nested line store.
    fn lines(&self) -> &dyn OrderLineStore;

    /// Insert the header, then each line, and return the hydrated order.
    async fn create_order(&self, draft: &OrderDraft) -> Result<Order, RepositoryError>;

    async fn find_order_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// Set the status and `updated_at`. Returns `None` if the order is gone.
    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>, RepositoryError>;

    /// Delete all lines, then the header. Returns header rows affected.
    async fn delete_order(&self, id: OrderId) -> Result<u64, RepositoryError>;
}

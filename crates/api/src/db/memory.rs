//! In-memory store adapter.
//!
//! One [`MemoryStore`] holds every table behind a single mutex and implements
//! all ports, mirroring the constraints the `PostgreSQL` schema enforces
//! (unique email, unique `(order_id, product_id)`, category references). The
//! lock is never held across an `.await`, so interleaving between calls
//! behaves like separate database round trips.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use hexshop_core::{CategoryId, Email, OrderId, OrderStatus, ProductId, UserId};

use super::RepositoryError;
use crate::models::{
    Category, NewUser, Order, OrderDraft, OrderLine, Product, ProductInput, User,
};
use crate::ports::{CategoryStore, OrderLineStore, OrderStore, ProductStore, UserStore};

#[derive(Debug, Clone)]
struct OrderHeader {
    status: OrderStatus,
    user_id: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    last_product_id: i32,
    last_category_id: i32,
    products: BTreeMap<ProductId, Product>,
    categories: BTreeMap<CategoryId, Category>,
    users: HashMap<UserId, (User, String)>,
    orders: HashMap<OrderId, OrderHeader>,
    // Insertion order doubles as line position.
    lines: Vec<(OrderId, OrderLine)>,
}

impl Tables {
    fn hydrate(&self, id: OrderId, header: &OrderHeader) -> Order {
        Order {
            id,
            status: header.status,
            user_id: header.user_id,
            user: self.users.get(&header.user_id).map(|(u, _)| u.clone()),
            lines: self.lines_of(id),
            created_at: header.created_at,
            updated_at: header.updated_at,
        }
    }

    fn lines_of(&self, id: OrderId) -> Vec<OrderLine> {
        self.lines
            .iter()
            .filter(|(order_id, _)| *order_id == id)
            .map(|(_, line)| *line)
            .collect()
    }

    fn user_by_email(&self, email: &Email) -> Option<&(User, String)> {
        self.users.values().find(|(u, _)| &u.email == email)
    }
}

/// Thread-safe in-memory implementation of every store port.
///
/// Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self.tables().products.values().cloned().collect())
    }

    async fn find_product_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.tables().products.get(&id).cloned())
    }

    async fn insert_product(&self, input: &ProductInput) -> Result<ProductId, RepositoryError> {
        let mut tables = self.tables();
        if !tables.categories.contains_key(&input.category_id) {
            return Err(RepositoryError::Conflict(
                "category does not exist".to_owned(),
            ));
        }

        tables.last_product_id += 1;
        let id = ProductId::new(tables.last_product_id);
        let now = Utc::now();
        tables.products.insert(
            id,
            Product {
                id,
                name: input.name.clone(),
                short_description: input.short_description.clone(),
                description: input.description.clone(),
                price: input.price,
                quantity: input.quantity,
                category_id: input.category_id,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn update_product(
        &self,
        product: &Product,
        id: ProductId,
    ) -> Result<u64, RepositoryError> {
        let mut tables = self.tables();
        if !tables.categories.contains_key(&product.category_id) {
            return Err(RepositoryError::Conflict(
                "category does not exist".to_owned(),
            ));
        }

        let Some(stored) = tables.products.get_mut(&id) else {
            return Ok(0);
        };
        stored.name.clone_from(&product.name);
        stored.short_description.clone_from(&product.short_description);
        stored.description.clone_from(&product.description);
        stored.price = product.price;
        stored.quantity = product.quantity;
        stored.category_id = product.category_id;
        stored.updated_at = Utc::now();
        Ok(1)
    }

    async fn delete_product(&self, id: ProductId) -> Result<u64, RepositoryError> {
        Ok(u64::from(self.tables().products.remove(&id).is_some()))
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        Ok(self.tables().categories.values().cloned().collect())
    }

    async fn find_category_by_id(
        &self,
        id: CategoryId,
    ) -> Result<Option<Category>, RepositoryError> {
        Ok(self.tables().categories.get(&id).cloned())
    }

    async fn insert_category(&self, name: &str) -> Result<CategoryId, RepositoryError> {
        let mut tables = self.tables();
        tables.last_category_id += 1;
        let id = CategoryId::new(tables.last_category_id);
        let now = Utc::now();
        tables.categories.insert(
            id,
            Category {
                id,
                name: name.to_owned(),
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn update_category(&self, id: CategoryId, name: &str) -> Result<u64, RepositoryError> {
        let mut tables = self.tables();
        let Some(category) = tables.categories.get_mut(&id) else {
            return Ok(0);
        };
        name.clone_into(&mut category.name);
        category.updated_at = Utc::now();
        Ok(1)
    }

    async fn delete_category(&self, id: CategoryId) -> Result<u64, RepositoryError> {
        let mut tables = self.tables();
        if tables.products.values().any(|p| p.category_id == id) {
            return Err(RepositoryError::Conflict(
                "category still has products".to_owned(),
            ));
        }
        Ok(u64::from(tables.categories.remove(&id).is_some()))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.tables();
        if tables.user_by_email(&user.email).is_some() {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let created = User {
            id: UserId::generate(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            surname: user.surname.clone(),
            created_at: Utc::now(),
        };
        tables
            .users
            .insert(created.id, (created.clone(), user.password_hash.clone()));
        Ok(created)
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables().users.get(&id).map(|(u, _)| u.clone()))
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables().user_by_email(email).map(|(u, _)| u.clone()))
    }

    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        Ok(self.tables().user_by_email(email).cloned())
    }

    async fn update_profile(
        &self,
        id: UserId,
        first_name: &str,
        surname: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let mut tables = self.tables();
        let Some((user, _)) = tables.users.get_mut(&id) else {
            return Ok(None);
        };
        first_name.clone_into(&mut user.first_name);
        surname.clone_into(&mut user.surname);
        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl OrderLineStore for MemoryStore {
    async fn add(
        &self,
        order_id: OrderId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        if quantity <= 0 {
            return Err(RepositoryError::Conflict(
                "order line quantity must be positive".to_owned(),
            ));
        }

        let mut tables = self.tables();
        if !tables.orders.contains_key(&order_id) {
            return Err(RepositoryError::Conflict("order does not exist".to_owned()));
        }
        if tables
            .lines
            .iter()
            .any(|(o, line)| *o == order_id && line.product_id == product_id)
        {
            return Err(RepositoryError::Conflict(
                "order line already exists".to_owned(),
            ));
        }

        tables
            .lines
            .push((order_id, OrderLine::new(product_id, quantity)));
        Ok(())
    }

    async fn get_products(&self, order_id: OrderId) -> Result<Vec<OrderLine>, RepositoryError> {
        Ok(self.tables().lines_of(order_id))
    }

    async fn delete_for_order(&self, order_id: OrderId) -> Result<u64, RepositoryError> {
        let mut tables = self.tables();
        let before = tables.lines.len();
        tables.lines.retain(|(o, _)| *o != order_id);
        Ok((before - tables.lines.len()) as u64)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    fn lines(&self) -> &dyn OrderLineStore {
        self
    }

    async fn create_order(&self, draft: &OrderDraft) -> Result<Order, RepositoryError> {
        if !draft.status.is_storable() {
            return Err(RepositoryError::DataCorruption(
                "refusing to store an empty order status".to_owned(),
            ));
        }

        let id = OrderId::generate();
        {
            let mut tables = self.tables();
            if !tables.users.contains_key(&draft.user_id) {
                return Err(RepositoryError::Conflict(
                    "order owner does not exist".to_owned(),
                ));
            }
            let now = Utc::now();
            tables.orders.insert(
                id,
                OrderHeader {
                    status: draft.status,
                    user_id: draft.user_id,
                    created_at: now,
                    updated_at: now,
                },
            );
        }

        for line in &draft.lines {
            self.lines().add(id, line.product_id, line.quantity).await?;
        }

        self.find_order_by_id(id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn find_order_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let tables = self.tables();
        Ok(tables
            .orders
            .get(&id)
            .map(|header| tables.hydrate(id, header)))
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

        let mut tables = self.tables();
        let Some(header) = tables.orders.get_mut(&id) else {
            return Ok(None);
        };
        header.status = status;
        header.updated_at = Utc::now();
        let header = header.clone();
        Ok(Some(tables.hydrate(id, &header)))
    }

    async fn delete_order(&self, id: OrderId) -> Result<u64, RepositoryError> {
        self.lines().delete_for_order(id).await?;
        Ok(u64::from(self.tables().orders.remove(&id).is_some()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    async fn user(store: &MemoryStore, email: &str) -> User {
        store
            .insert_user(&NewUser {
                email: Email::parse(email).unwrap(),
                first_name: "Ada".to_owned(),
                surname: "Lovelace".to_owned(),
                password_hash: "hash".to_owned(),
            })
            .await
            .unwrap()
    }

    async fn product(store: &MemoryStore, quantity: i32) -> ProductId {
        let category = store.insert_category("Tools").await.unwrap();
        store
            .insert_product(&ProductInput {
                name: "Hammer".to_owned(),
                short_description: String::new(),
                description: String::new(),
                price: Decimal::new(1999, 2),
                quantity,
                category_id: category,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        user(&store, "ada@example.com").await;

        let err = store
            .insert_user(&NewUser {
                email: Email::parse("ADA@example.com").unwrap(),
                first_name: "A".to_owned(),
                surname: "B".to_owned(),
                password_hash: "x".to_owned(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_product_requires_existing_category() {
        let store = MemoryStore::new();
        let err = store
            .insert_product(&ProductInput {
                name: "Orphan".to_owned(),
                short_description: String::new(),
                description: String::new(),
                price: Decimal::ONE,
                quantity: 1,
                category_id: CategoryId::new(99),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_category_with_products_cannot_be_deleted() {
        let store = MemoryStore::new();
        let id = product(&store, 1).await;
        let category = store.find_product_by_id(id).await.unwrap().unwrap().category_id;

        let err = store.delete_category(category).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));

        store.delete_product(id).await.unwrap();
        assert_eq!(store.delete_category(category).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_missing_product_affects_no_rows() {
        let store = MemoryStore::new();
        let id = product(&store, 5).await;
        let existing = store.find_product_by_id(id).await.unwrap().unwrap();

        let affected = store
            .update_product(&existing, ProductId::new(404))
            .await
            .unwrap();
        assert_eq!(affected, 0);
    }

    #[tokio::test]
    async fn test_order_lines_keep_insertion_order_and_hydrate_user() {
        let store = MemoryStore::new();
        let owner = user(&store, "ada@example.com").await;
        let first = product(&store, 5).await;
        let second = product(&store, 5).await;

        let order = store
            .create_order(&OrderDraft {
                user_id: owner.id,
                status: OrderStatus::Created,
                lines: vec![OrderLine::new(second, 2), OrderLine::new(first, 1)],
            })
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Created);
        assert_eq!(
            order.lines,
            vec![OrderLine::new(second, 2), OrderLine::new(first, 1)]
        );
        assert_eq!(order.user.unwrap().id, owner.id);
    }

    #[tokio::test]
    async fn test_duplicate_order_line_conflicts() {
        let store = MemoryStore::new();
        let owner = user(&store, "ada@example.com").await;
        let id = product(&store, 5).await;

        let order = store
            .create_order(&OrderDraft {
                user_id: owner.id,
                status: OrderStatus::Created,
                lines: vec![OrderLine::new(id, 1)],
            })
            .await
            .unwrap();

        let err = store.lines().add(order.id, id, 1).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_empty_status_is_never_stored() {
        let store = MemoryStore::new();
        let owner = user(&store, "ada@example.com").await;

        let err = store
            .create_order(&OrderDraft {
                user_id: owner.id,
                status: OrderStatus::Unset,
                lines: Vec::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }

    #[tokio::test]
    async fn test_delete_order_removes_lines() {
        let store = MemoryStore::new();
        let owner = user(&store, "ada@example.com").await;
        let id = product(&store, 5).await;

        let order = store
            .create_order(&OrderDraft {
                user_id: owner.id,
                status: OrderStatus::Created,
                lines: vec![OrderLine::new(id, 1)],
            })
            .await
            .unwrap();

        assert_eq!(store.delete_order(order.id).await.unwrap(), 1);
        assert!(store.find_order_by_id(order.id).await.unwrap().is_none());
        assert!(store.get_products(order.id).await.unwrap().is_empty());
        assert_eq!(store.delete_order(order.id).await.unwrap(), 0);
    }
}

//! Order placement and status workflow.
//!
//! Placing an order reserves stock line by line: each product is read, checked
//! and written back with its quantity reduced before the order header is
//! stored. The sequence is not transactional. A failure on a later line leaves
//! earlier lines' reservations in place, and two concurrent orders for the
//! same product may both pass the stock check.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::instrument;

use hexshop_core::{OrderId, OrderStatus, ProductId};

use crate::db::RepositoryError;
use crate::models::{NewOrder, Order, OrderDraft, OrderLine, OrderStatusChange};
use crate::ports::{OrderStore, ProductStore};

/// Errors from the order workflow.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// A line is unusable as submitted.
    #[error("invalid order line: {reason}")]
    InvalidOrderLine { reason: String },

    #[error("insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: i32,
        available: i32,
    },

    #[error("invalid order status: {0:?}")]
    InvalidOrderStatus(String),

    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    /// A store call failed.
    #[error("failed to {context}: {source}")]
    Persistence {
        context: &'static str,
        #[source]
        source: RepositoryError,
    },
}

impl From<hexshop_core::InvalidOrderStatus> for OrderError {
    fn from(e: hexshop_core::InvalidOrderStatus) -> Self {
        Self::InvalidOrderStatus(e.0)
    }
}

trait PersistenceContext<T> {
    fn context(self, context: &'static str) -> Result<T, OrderError>;
}

impl<T> PersistenceContext<T> for Result<T, RepositoryError> {
    fn context(self, context: &'static str) -> Result<T, OrderError> {
        self.map_err(|source| OrderError::Persistence { context, source })
    }
}

/// Tunables for [`OrderService`].
#[derive(Debug, Clone, Copy)]
pub struct OrderOptions {
    /// Reserve stock again for lines sent with a status update.
    pub reserve_stock_on_status_update: bool,
}

impl Default for OrderOptions {
    fn default() -> Self {
        Self {
            reserve_stock_on_status_update: true,
        }
    }
}

/// Order use cases.
#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderStore>,
    products: Arc<dyn ProductStore>,
    options: OrderOptions,
}

impl OrderService {
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderStore>,
        products: Arc<dyn ProductStore>,
        options: OrderOptions,
    ) -> Self {
        Self {
            orders,
            products,
            options,
        }
    }

    /// Place an order.
    ///
    /// The stored status is always [`OrderStatus::Created`]; whatever status
    /// the caller sent is ignored. Stock for every line is reserved before the
    /// header is written.
    ///
    /// # Errors
    ///
    /// - `InvalidOrderLine` for an empty order, a repeated product, or a
    ///   non-positive quantity
    /// - `ProductNotFound` if a line names an unknown product
    /// - `InsufficientStock` if a line asks for more than is on hand
    /// - `Persistence` if a store call fails
    #[instrument(skip(self, order), fields(user_id = %order.user_id, lines = order.lines.len()))]
    pub async fn create_order(&self, order: NewOrder) -> Result<Order, OrderError> {
        if let Some(requested) = order.status.as_deref().filter(|s| !s.is_empty()) {
            tracing::debug!(requested, "ignoring caller-supplied status");
        }

        check_lines(&order.lines)?;

        for line in &order.lines {
            self.reserve_stock(line).await?;
        }

        let created = self
            .orders
            .create_order(&OrderDraft {
                user_id: order.user_id,
                status: OrderStatus::Created,
                lines: order.lines,
            })
            .await
            .context("create order")?;

        tracing::info!(order_id = %created.id, "order created");
        Ok(created)
    }

    /// Change an order's status.
    ///
    /// An empty status keeps the stored one. Lines sent with the request
    /// reserve stock again unless disabled in [`OrderOptions`]; the stored
    /// lines are not changed.
    ///
    /// # Errors
    ///
    /// - `InvalidOrderStatus` if the status is not one of the known values
    /// - `OrderNotFound` if the order doesn't exist
    /// - the stock errors of [`Self::create_order`] for attached lines
    /// - `Persistence` if a store call fails
    #[instrument(skip(self, change), fields(order_id = %change.id, status = %change.status))]
    pub async fn update_order_status(&self, change: OrderStatusChange) -> Result<Order, OrderError> {
        let status = OrderStatus::parse(&change.status)?;

        let existing = self
            .orders
            .find_order_by_id(change.id)
            .await
            .context("load order")?
            .ok_or(OrderError::OrderNotFound(change.id))?;

        if self.options.reserve_stock_on_status_update {
            for line in &change.lines {
                self.reserve_stock(line).await?;
            }
        } else if !change.lines.is_empty() {
            tracing::debug!(lines = change.lines.len(), "stock reservation on update disabled");
        }

        let status = if status.is_storable() {
            status
        } else {
            existing.status
        };

        let updated = self
            .orders
            .update_order_status(change.id, status)
            .await
            .context("update order status")?
            .ok_or(OrderError::OrderNotFound(change.id))?;

        tracing::info!(from = %existing.status, to = %updated.status, "order status updated");
        Ok(updated)
    }

    /// Delete an order and its lines. Reserved stock is not returned.
    ///
    /// # Errors
    ///
    /// - `OrderNotFound` if the order doesn't exist
    /// - `Persistence` if a store call fails
    #[instrument(skip(self))]
    pub async fn delete_order(&self, id: OrderId) -> Result<(), OrderError> {
        let deleted = self.orders.delete_order(id).await.context("delete order")?;
        if deleted == 0 {
            return Err(OrderError::OrderNotFound(id));
        }

        tracing::info!(order_id = %id, "order deleted");
        Ok(())
    }

    /// Look up an order with its lines and owner.
    ///
    /// # Errors
    ///
    /// - `OrderNotFound` if the order doesn't exist
    /// - `Persistence` if a store call fails
    pub async fn find_order_by_id(&self, id: OrderId) -> Result<Order, OrderError> {
        self.orders
            .find_order_by_id(id)
            .await
            .context("load order")?
            .ok_or(OrderError::OrderNotFound(id))
    }

    /// Read, check and write back one product's stock.
    #[instrument(skip(self), fields(product_id = %line.product_id, quantity = line.quantity))]
    async fn reserve_stock(&self, line: &OrderLine) -> Result<(), OrderError> {
        let mut product = self
            .products
            .find_product_by_id(line.product_id)
            .await
            .context("load product")?
            .ok_or(OrderError::ProductNotFound(line.product_id))?;

        if line.quantity <= 0 {
            return Err(OrderError::InvalidOrderLine {
                reason: format!(
                    "quantity for product {} must be positive, got {}",
                    line.product_id, line.quantity
                ),
            });
        }

        if product.quantity < line.quantity {
            return Err(OrderError::InsufficientStock {
                product_id: line.product_id,
                requested: line.quantity,
                available: product.quantity,
            });
        }

        product.quantity -= line.quantity;

        let affected = self
            .products
            .update_product(&product, line.product_id)
            .await
            .context("update product stock")?;
        if affected == 0 {
            return Err(OrderError::ProductNotFound(line.product_id));
        }

        tracing::debug!(remaining = product.quantity, "stock reserved");
        Ok(())
    }
}

/// Whole-order checks that run before any stock is touched.
fn check_lines(lines: &[OrderLine]) -> Result<(), OrderError> {
    if lines.is_empty() {
        return Err(OrderError::InvalidOrderLine {
            reason: "order has no lines".to_owned(),
        });
    }

    let mut seen = HashSet::with_capacity(lines.len());
    for line in lines {
        if !seen.insert(line.product_id) {
            return Err(OrderError::InvalidOrderLine {
                reason: format!("product {} appears more than once", line.product_id),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use hexshop_core::{Email, UserId};

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{NewUser, ProductInput};
    use crate::ports::{CategoryStore, OrderLineStore, UserStore};

    struct Fixture {
        store: MemoryStore,
        service: OrderService,
        user_id: UserId,
    }

    impl Fixture {
        async fn new(options: OrderOptions) -> Self {
            let store = MemoryStore::new();
            let user = store
                .insert_user(&NewUser {
                    email: Email::parse("buyer@example.com").unwrap(),
                    first_name: "Grace".to_owned(),
                    surname: "Hopper".to_owned(),
                    password_hash: "hash".to_owned(),
                })
                .await
                .unwrap();
            let service = OrderService::new(
                Arc::new(store.clone()),
                Arc::new(store.clone()),
                options,
            );
            Self {
                store,
                service,
                user_id: user.id,
            }
        }

        async fn product(&self, quantity: i32) -> ProductId {
            let category = self.store.insert_category("General").await.unwrap();
            self.store
                .insert_product(&ProductInput {
                    name: "Widget".to_owned(),
                    short_description: String::new(),
                    description: String::new(),
                    price: Decimal::new(250, 2),
                    quantity,
                    category_id: category,
                })
                .await
                .unwrap()
        }

        async fn stock(&self, id: ProductId) -> i32 {
            self.store
                .find_product_by_id(id)
                .await
                .unwrap()
                .unwrap()
                .quantity
        }

        fn new_order(&self, lines: Vec<OrderLine>) -> NewOrder {
            NewOrder {
                user_id: self.user_id,
                status: None,
                lines,
            }
        }
    }

    #[tokio::test]
    async fn test_create_reserves_stock() {
        let f = Fixture::new(OrderOptions::default()).await;
        let p = f.product(100).await;

        let order = f
            .service
            .create_order(f.new_order(vec![OrderLine::new(p, 10)]))
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Created);
        assert_eq!(order.lines, vec![OrderLine::new(p, 10)]);
        assert_eq!(order.user.as_ref().unwrap().id, f.user_id);
        assert_eq!(f.stock(p).await, 90);
    }

    #[tokio::test]
    async fn test_create_can_take_all_stock() {
        let f = Fixture::new(OrderOptions::default()).await;
        let p = f.product(7).await;

        f.service
            .create_order(f.new_order(vec![OrderLine::new(p, 7)]))
            .await
            .unwrap();

        assert_eq!(f.stock(p).await, 0);
    }

    #[tokio::test]
    async fn test_create_ignores_caller_status() {
        let f = Fixture::new(OrderOptions::default()).await;
        let p = f.product(5).await;

        for status in ["CLOSED", "bogus", ""] {
            let mut order = f.new_order(vec![OrderLine::new(p, 1)]);
            order.status = Some(status.to_owned());
            let created = f.service.create_order(order).await.unwrap();
            assert_eq!(created.status, OrderStatus::Created);
        }
    }

    #[tokio::test]
    async fn test_create_insufficient_stock() {
        let f = Fixture::new(OrderOptions::default()).await;
        let p = f.product(100).await;

        let err = f
            .service
            .create_order(f.new_order(vec![OrderLine::new(p, 101)]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            OrderError::InsufficientStock {
                requested: 101,
                available: 100,
                ..
            }
        ));
        assert_eq!(f.stock(p).await, 100);
    }

    #[tokio::test]
    async fn test_create_rejects_non_positive_quantity() {
        let f = Fixture::new(OrderOptions::default()).await;
        let p = f.product(100).await;

        for quantity in [0, -3] {
            let err = f
                .service
                .create_order(f.new_order(vec![OrderLine::new(p, quantity)]))
                .await
                .unwrap_err();
            assert!(matches!(err, OrderError::InvalidOrderLine { .. }));
        }
        assert_eq!(f.stock(p).await, 100);
    }

    #[tokio::test]
    async fn test_create_unknown_product() {
        let f = Fixture::new(OrderOptions::default()).await;

        let err = f
            .service
            .create_order(f.new_order(vec![OrderLine::new(ProductId::new(555), 1)]))
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::ProductNotFound(id) if id == ProductId::new(555)));
    }

    #[tokio::test]
    async fn test_unknown_product_reported_before_bad_quantity() {
        let f = Fixture::new(OrderOptions::default()).await;

        let err = f
            .service
            .create_order(f.new_order(vec![OrderLine::new(ProductId::new(555), 0)]))
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::ProductNotFound(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_and_repeated_lines() {
        let f = Fixture::new(OrderOptions::default()).await;
        let p = f.product(10).await;

        let err = f.service.create_order(f.new_order(vec![])).await.unwrap_err();
        assert!(matches!(err, OrderError::InvalidOrderLine { .. }));

        let err = f
            .service
            .create_order(f.new_order(vec![OrderLine::new(p, 1), OrderLine::new(p, 2)]))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidOrderLine { .. }));
        assert_eq!(f.stock(p).await, 10);
    }

    #[tokio::test]
    async fn test_failed_line_keeps_earlier_reservations() {
        let f = Fixture::new(OrderOptions::default()).await;
        let plenty = f.product(10).await;
        let scarce = f.product(1).await;

        let err = f
            .service
            .create_order(f.new_order(vec![
                OrderLine::new(plenty, 4),
                OrderLine::new(scarce, 2),
            ]))
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::InsufficientStock { .. }));
        assert_eq!(f.stock(plenty).await, 6);
        assert_eq!(f.stock(scarce).await, 1);
    }

    #[tokio::test]
    async fn test_update_status() {
        let f = Fixture::new(OrderOptions::default()).await;
        let p = f.product(10).await;
        let order = f
            .service
            .create_order(f.new_order(vec![OrderLine::new(p, 1)]))
            .await
            .unwrap();

        let updated = f
            .service
            .update_order_status(OrderStatusChange {
                id: order.id,
                status: "PENDING".to_owned(),
                lines: Vec::new(),
            })
            .await
            .unwrap();

        assert_eq!(updated.status, OrderStatus::Pending);
        assert_eq!(
            f.service.find_order_by_id(order.id).await.unwrap().status,
            OrderStatus::Pending
        );
        assert_eq!(f.stock(p).await, 9);
    }

    #[tokio::test]
    async fn test_update_invalid_status_persists_nothing() {
        let f = Fixture::new(OrderOptions::default()).await;
        let p = f.product(10).await;
        let order = f
            .service
            .create_order(f.new_order(vec![OrderLine::new(p, 1)]))
            .await
            .unwrap();

        for status in ["invalid", "pending", "Pending "] {
            let err = f
                .service
                .update_order_status(OrderStatusChange {
                    id: order.id,
                    status: status.to_owned(),
                    lines: vec![OrderLine::new(p, 1)],
                })
                .await
                .unwrap_err();
            assert!(matches!(err, OrderError::InvalidOrderStatus(s) if s == status));
        }

        let stored = f.service.find_order_by_id(order.id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Created);
        assert_eq!(stored.updated_at, order.updated_at);
        assert_eq!(f.stock(p).await, 9);
    }

    #[tokio::test]
    async fn test_update_empty_status_keeps_stored_status() {
        let f = Fixture::new(OrderOptions::default()).await;
        let p = f.product(10).await;
        let order = f
            .service
            .create_order(f.new_order(vec![OrderLine::new(p, 1)]))
            .await
            .unwrap();

        let updated = f
            .service
            .update_order_status(OrderStatusChange {
                id: order.id,
                status: String::new(),
                lines: Vec::new(),
            })
            .await
            .unwrap();

        assert_eq!(updated.status, OrderStatus::Created);
    }

    #[tokio::test]
    async fn test_update_missing_order() {
        let f = Fixture::new(OrderOptions::default()).await;
        let p = f.product(10).await;
        let id = OrderId::generate();

        let err = f
            .service
            .update_order_status(OrderStatusChange {
                id,
                status: "CLOSED".to_owned(),
                lines: vec![OrderLine::new(p, 1)],
            })
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::OrderNotFound(missing) if missing == id));
        assert_eq!(f.stock(p).await, 10);
    }

    #[tokio::test]
    async fn test_update_with_lines_reserves_again() {
        let f = Fixture::new(OrderOptions::default()).await;
        let p = f.product(10).await;
        let order = f
            .service
            .create_order(f.new_order(vec![OrderLine::new(p, 3)]))
            .await
            .unwrap();

        f.service
            .update_order_status(OrderStatusChange {
                id: order.id,
                status: "COMPLETED".to_owned(),
                lines: order.lines.clone(),
            })
            .await
            .unwrap();

        assert_eq!(f.stock(p).await, 4);
    }

    #[tokio::test]
    async fn test_update_reservation_can_be_disabled() {
        let f = Fixture::new(OrderOptions {
            reserve_stock_on_status_update: false,
        })
        .await;
        let p = f.product(10).await;
        let order = f
            .service
            .create_order(f.new_order(vec![OrderLine::new(p, 3)]))
            .await
            .unwrap();

        let updated = f
            .service
            .update_order_status(OrderStatusChange {
                id: order.id,
                status: "COMPLETED".to_owned(),
                lines: vec![OrderLine::new(p, 50)],
            })
            .await
            .unwrap();

        assert_eq!(updated.status, OrderStatus::Completed);
        assert_eq!(f.stock(p).await, 7);
    }

    #[tokio::test]
    async fn test_update_with_excess_lines_fails() {
        let f = Fixture::new(OrderOptions::default()).await;
        let p = f.product(5).await;
        let order = f
            .service
            .create_order(f.new_order(vec![OrderLine::new(p, 3)]))
            .await
            .unwrap();

        let err = f
            .service
            .update_order_status(OrderStatusChange {
                id: order.id,
                status: "PENDING".to_owned(),
                lines: vec![OrderLine::new(p, 3)],
            })
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::InsufficientStock { available: 2, .. }));
        assert_eq!(
            f.service.find_order_by_id(order.id).await.unwrap().status,
            OrderStatus::Created
        );
    }

    #[tokio::test]
    async fn test_delete_does_not_restore_stock() {
        let f = Fixture::new(OrderOptions::default()).await;
        let p = f.product(10).await;
        let order = f
            .service
            .create_order(f.new_order(vec![OrderLine::new(p, 4)]))
            .await
            .unwrap();

        f.service.delete_order(order.id).await.unwrap();

        assert!(matches!(
            f.service.find_order_by_id(order.id).await,
            Err(OrderError::OrderNotFound(_))
        ));
        assert!(f.store.get_products(order.id).await.unwrap().is_empty());
        assert_eq!(f.stock(p).await, 6);

        assert!(matches!(
            f.service.delete_order(order.id).await,
            Err(OrderError::OrderNotFound(_))
        ));
    }

    #[test]
    fn test_persistence_error_names_operation() {
        let err: Result<(), _> = Err::<(), _>(RepositoryError::NotFound).context("load product");
        assert_eq!(
            err.unwrap_err().to_string(),
            "failed to load product: not found"
        );
    }
}

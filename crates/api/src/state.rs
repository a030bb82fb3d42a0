//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::db::Stores;
use crate::services::{AuthService, CategoryService, OrderService, ProductService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and hands out the services
/// wired to the configured stores.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    /// Present only with `PostgreSQL` storage.
    pool: Option<PgPool>,
    orders: OrderService,
    categories: CategoryService,
    products: ProductService,
    auth: AuthService,
}

impl AppState {
    /// Wire the services to `stores`.
    ///
    /// # Arguments
    ///
    /// * `config` - Service configuration
    /// * `stores` - Store adapters the services run against
    /// * `pool` - The pool behind `stores`, if they are database-backed
    #[must_use]
    pub fn new(config: ApiConfig, stores: Stores, pool: Option<PgPool>) -> Self {
        let orders = OrderService::new(
            Arc::clone(&stores.orders),
            Arc::clone(&stores.products),
            config.orders,
        );
        let categories = CategoryService::new(Arc::clone(&stores.categories));
        let products = ProductService::new(stores.products, stores.categories);
        let auth = AuthService::new(stores.users);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                orders,
                categories,
                products,
                auth,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Database pool, when running against `PostgreSQL`.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }

    #[must_use]
    pub fn categories(&self) -> &CategoryService {
        &self.inner.categories
    }

    #[must_use]
    pub fn products(&self) -> &ProductService {
        &self.inner.products
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }
}

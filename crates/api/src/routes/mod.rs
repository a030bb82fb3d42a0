//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                - Liveness check
//! GET    /health/ready          - Readiness check (database ping)
//!
//! # Users
//! POST   /user/register         - Register an account
//! POST   /user/login            - Log in (sets session cookie)
//! POST   /user/logout           - Log out
//! PUT    /user                  - Update profile (requires auth)
//!
//! # Catalog
//! GET    /category              - List categories
//! POST   /category              - Create a category
//! GET    /category/{id}         - Category detail
//! PUT    /category/{id}         - Rename a category
//! DELETE /category/{id}         - Delete a category
//! GET    /product               - List products
//! POST   /product               - Create a product
//! GET    /product/{id}          - Product detail
//! PUT    /product/{id}          - Replace a product
//! DELETE /product/{id}          - Delete a product
//!
//! # Orders (requires auth, owner only)
//! POST   /order                 - Place an order
//! PUT    /order                 - Change an order's status
//! GET    /order/{id}            - Order detail
//! DELETE /order/{id}            - Delete an order
//! ```

pub mod categories;
pub mod orders;
pub mod products;
pub mod users;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user", put(users::update_profile))
        .route("/user/register", post(users::register))
        .route("/user/login", post(users::login))
        .route("/user/logout", post(users::logout))
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/category",
            get(categories::index).post(categories::create),
        )
        .route(
            "/category/{id}",
            get(categories::show)
                .put(categories::update)
                .delete(categories::delete),
        )
        .route("/product", get(products::index).post(products::create))
        .route(
            "/product/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/order", post(orders::create).put(orders::update))
        .route("/order/{id}", get(orders::show).delete(orders::delete))
}

/// Create all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(user_routes())
        .merge(catalog_routes())
        .merge(order_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Pings the database when there is one. Returns 503 Service Unavailable if
/// it is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    let Some(pool) = state.pool() else {
        return StatusCode::OK;
    };

    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

//! Order route handlers.
//!
//! All order routes require a session. An order is only visible to the user
//! who placed it.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use hexshop_core::OrderId;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, NewOrder, Order, OrderLine, OrderStatusChange};
use crate::state::AppState;

/// Order placement request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Accepted for compatibility; new orders always start as `CREATED`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub product_items: Vec<OrderLine>,
}

/// Status change request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    pub id: OrderId,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub product_items: Vec<OrderLine>,
}

/// Load an order and check that `user` owns it.
async fn owned_order(state: &AppState, user: &CurrentUser, id: OrderId) -> Result<Order> {
    let order = state.orders().find_order_by_id(id).await?;
    if order.user_id != user.id {
        tracing::warn!(order_id = %id, user_id = %user.id, "access to foreign order denied");
        return Err(AppError::Forbidden("order belongs to another user".to_string()));
    }
    Ok(order)
}

/// Place an order for the logged-in user.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Response> {
    let order = state
        .orders()
        .create_order(NewOrder {
            user_id: user.id,
            status: req.status,
            lines: req.product_items,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(order)).into_response())
}

pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    Ok(Json(owned_order(&state, &user, id).await?))
}

/// Change an order's status.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<UpdateOrderRequest>,
) -> Result<Json<Order>> {
    owned_order(&state, &user, req.id).await?;

    let order = state
        .orders()
        .update_order_status(OrderStatusChange {
            id: req.id,
            status: req.status,
            lines: req.product_items,
        })
        .await?;

    Ok(Json(order))
}

pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<StatusCode> {
    owned_order(&state, &user, id).await?;
    state.orders().delete_order(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

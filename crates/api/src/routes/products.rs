//! Product route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use hexshop_core::ProductId;

use crate::error::Result;
use crate::models::{Product, ProductInput};
use crate::state::AppState;

/// List all products with their current stock.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.products().list().await?))
}

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    Ok(Json(state.products().find(id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<ProductInput>,
) -> Result<Response> {
    let product = state.products().create(input).await?;
    Ok((StatusCode::CREATED, Json(product)).into_response())
}

/// Replace a product's writable fields, stock included.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(input): Json<ProductInput>,
) -> Result<Json<Product>> {
    Ok(Json(state.products().update(id, input).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    state.products().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

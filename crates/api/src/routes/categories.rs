//! Category route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use hexshop_core::CategoryId;

use crate::error::Result;
use crate::models::{Category, CategoryInput};
use crate::state::AppState;

pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(state.categories().list().await?))
}

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<Category>> {
    Ok(Json(state.categories().find(id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CategoryInput>,
) -> Result<Response> {
    let category = state.categories().create(&input.name).await?;
    Ok((StatusCode::CREATED, Json(category)).into_response())
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    Json(input): Json<CategoryInput>,
) -> Result<Json<Category>> {
    Ok(Json(state.categories().update(id, &input.name).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<StatusCode> {
    state.categories().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

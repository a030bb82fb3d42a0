//! User route handlers: registration, login, logout and profile.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::Registration;
use crate::state::AppState;

/// Registration request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub surname: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Profile update request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub first_name: String,
    pub surname: String,
}

/// Register a new account. Does not log the user in.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Response> {
    let user = state
        .auth()
        .register(Registration {
            email: &req.email,
            password: &req.password,
            first_name: &req.first_name,
            surname: &req.surname,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user)).into_response())
}

/// Log in with email and password and start a session.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> Result<Json<User>> {
    let user = state.auth().login(&req.email, &req.password).await?;

    set_current_user(&session, &CurrentUser::from(&user)).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, "user logged in");

    Ok(Json(user))
}

/// End the current session.
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// Update the logged-in user's name.
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<User>> {
    let user = state
        .auth()
        .update_profile(current.id, &req.first_name, &req.surname)
        .await
        .map_err(|e| match e {
            crate::services::AuthError::UserNotFound => {
                AppError::Unauthorized("account no longer exists".to_string())
            }
            other => other.into(),
        })?;

    Ok(Json(user))
}

//! Hexshop order service.
//!
//! A small e-commerce backend arranged around ports and adapters:
//!
//! - [`models`] - domain types
//! - [`ports`] - store traits the services depend on
//! - [`db`] - `PostgreSQL` and in-memory store adapters
//! - [`services`] - order workflow, catalog and authentication use cases
//! - [`routes`] - axum JSON handlers
//!
//! [`app`] assembles the full router for a given [`state::AppState`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod ports;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::middleware::SessionKeyError;
use crate::state::AppState;

/// Build the application router with its middleware stack.
///
/// # Errors
///
/// Returns [`SessionKeyError`] if the configured session secret cannot sign
/// cookies.
pub fn app(state: AppState) -> Result<Router, SessionKeyError> {
    let router = middleware::with_sessions(routes::routes(), state.pool(), state.config())?;

    Ok(router
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                    user_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction()))
}

//! Session middleware configuration.
//!
//! Sessions live in `PostgreSQL` when the service runs against a database and
//! in process memory otherwise. The cookie is signed with the configured
//! session secret either way.

use axum::Router;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use tower_sessions::cookie::{Key, SameSite, time::Duration};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::ApiConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "hexshop_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// The session secret could not be turned into a signing key.
#[derive(Debug, thiserror::Error)]
#[error("invalid session secret: {0}")]
pub struct SessionKeyError(String);

macro_rules! session_layer {
    ($store:expr, $key:expr, $secure:expr) => {
        SessionManagerLayer::new($store)
            .with_name(SESSION_COOKIE_NAME)
            .with_expiry(Expiry::OnInactivity(Duration::seconds(
                SESSION_EXPIRY_SECONDS,
            )))
            .with_secure($secure)
            .with_same_site(SameSite::Lax)
            .with_http_only(true)
            .with_path("/")
            .with_signed($key)
    };
}

/// Wrap `router` in a session layer.
///
/// Uses a [`PostgresStore`] over `pool` when one is given, otherwise an
/// in-memory store.
///
/// # Errors
///
/// Returns [`SessionKeyError`] if the session secret is too short to sign
/// cookies with.
pub fn with_sessions<S>(
    router: Router<S>,
    pool: Option<&PgPool>,
    config: &ApiConfig,
) -> Result<Router<S>, SessionKeyError>
where
    S: Clone + Send + Sync + 'static,
{
    let key = Key::try_from(config.session_secret.expose_secret().as_bytes())
        .map_err(|e| SessionKeyError(e.to_string()))?;

    Ok(match pool {
        Some(pool) => router.layer(session_layer!(
            PostgresStore::new(pool.clone()),
            key,
            config.secure_cookies
        )),
        None => router.layer(session_layer!(
            MemoryStore::default(),
            key,
            config.secure_cookies
        )),
    })
}

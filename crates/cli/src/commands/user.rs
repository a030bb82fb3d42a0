//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! hexshop user create -e ada@example.com --first-name Ada --surname Lovelace
//! ```
//!
//! The password is read from `HEXSHOP_NEW_USER_PASSWORD` so it never lands in
//! shell history.

use hexshop_api::db::Stores;
use hexshop_api::services::{AuthService, Registration};

use super::{CommandError, connect};

/// Environment variable holding the new user's password.
const PASSWORD_VAR: &str = "HEXSHOP_NEW_USER_PASSWORD";

/// Register a user directly in the database.
///
/// # Errors
///
/// Returns an error if the password variable is missing, the input fails
/// validation, or the email is already registered.
pub async fn create(email: &str, first_name: &str, surname: &str) -> Result<(), CommandError> {
    dotenvy::dotenv().ok();
    let password =
        std::env::var(PASSWORD_VAR).map_err(|_| CommandError::MissingEnvVar(PASSWORD_VAR))?;

    let pool = connect().await?;
    let auth = AuthService::new(Stores::postgres(&pool).users);

    let user = auth
        .register(Registration {
            email,
            password: &password,
            first_name,
            surname,
        })
        .await?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );
    Ok(())
}

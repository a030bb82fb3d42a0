//! Authentication service.
//!
//! Password registration and login, plus profile maintenance for the
//! logged-in user.

mod error;

pub use error::AuthError;

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::instrument;

use hexshop_core::{Email, UserId};

use crate::db::RepositoryError;
use crate::models::{NewUser, User};
use crate::ports::UserStore;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Fields collected at registration.
#[derive(Debug, Clone)]
pub struct Registration<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub first_name: &'a str,
    pub surname: &'a str,
}

/// Authentication service.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
}

impl AuthService {
    /// Create a new authentication service.
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Register a new user with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::MissingField` if a name is blank.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip_all, fields(email = %registration.email))]
    pub async fn register(&self, registration: Registration<'_>) -> Result<User, AuthError> {
        let email = Email::parse(registration.email)?;
        validate_password(registration.password)?;
        let first_name = required("first name", registration.first_name)?;
        let surname = required("surname", registration.surname)?;

        let password_hash = hash_password(registration.password)?;

        let user = self
            .users
            .insert_user(&NewUser {
                email,
                first_name,
                surname,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Login with email and password.
    ///
    /// Unknown emails and wrong passwords are indistinguishable to the caller.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Replace the user's first name and surname.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingField` if a name is blank.
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    #[instrument(skip(self, first_name, surname))]
    pub async fn update_profile(
        &self,
        user_id: UserId,
        first_name: &str,
        surname: &str,
    ) -> Result<User, AuthError> {
        let first_name = required("first name", first_name)?;
        let surname = required("surname", surname)?;

        self.users
            .update_profile(user_id, &first_name, &surname)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn find_by_id(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .find_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

fn required(field: &'static str, value: &str) -> Result<String, AuthError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AuthError::MissingField(field));
    }
    Ok(value.to_owned())
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn service() -> AuthService {
        AuthService::new(Arc::new(MemoryStore::new()))
    }

    fn ada(password: &str) -> Registration<'_> {
        Registration {
            email: "Ada@Example.com",
            password,
            first_name: "Ada",
            surname: "Lovelace",
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_validate_password_length() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("longenough").is_ok());
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let auth = service();
        let user = auth.register(ada("hunter2hunter2")).await.unwrap();
        assert_eq!(user.email.as_str(), "ada@example.com");

        let logged_in = auth
            .login("ada@example.com", "hunter2hunter2")
            .await
            .unwrap();
        assert_eq!(logged_in.id, user.id);
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let auth = service();
        auth.register(ada("hunter2hunter2")).await.unwrap();

        let err = auth.register(ada("another-password")).await.unwrap_err();
        assert!(matches!(err, AuthError::UserAlreadyExists));
    }

    #[tokio::test]
    async fn test_register_rejects_bad_input() {
        let auth = service();

        let err = auth
            .register(Registration {
                email: "not-an-email",
                ..ada("hunter2hunter2")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidEmail(_)));

        let err = auth.register(ada("short")).await.unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword(_)));

        let err = auth
            .register(Registration {
                surname: "  ",
                ..ada("hunter2hunter2")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingField("surname")));
    }

    #[tokio::test]
    async fn test_login_failures_are_uniform() {
        let auth = service();
        auth.register(ada("hunter2hunter2")).await.unwrap();

        let wrong_password = auth.login("ada@example.com", "nope-nope").await;
        let unknown_user = auth.login("bob@example.com", "hunter2hunter2").await;
        let garbage = auth.login("garbage", "hunter2hunter2").await;

        assert!(matches!(wrong_password, Err(AuthError::InvalidCredentials)));
        assert!(matches!(unknown_user, Err(AuthError::InvalidCredentials)));
        assert!(matches!(garbage, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_update_profile() {
        let auth = service();
        let user = auth.register(ada("hunter2hunter2")).await.unwrap();

        let updated = auth
            .update_profile(user.id, "Augusta", "King")
            .await
            .unwrap();
        assert_eq!(updated.first_name, "Augusta");
        assert_eq!(updated.surname, "King");
        assert_eq!(auth.find_by_id(user.id).await.unwrap().surname, "King");

        let err = auth
            .update_profile(UserId::generate(), "A", "B")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));
    }
}

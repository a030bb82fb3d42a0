//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use hexshop_core::{Email, UserId};

/// A registered customer.
///
/// The password hash is not part of this type; it is only
/// read through [`crate::ports::UserStore::get_password_hash`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub first_name: String,
    pub surname: String,
    pub created_at: DateTime<Utc>,
}

/// A user about to be inserted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub first_name: String,
    pub surname: String,
    pub password_hash: String,
}

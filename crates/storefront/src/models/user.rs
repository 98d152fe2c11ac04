//! User domain types.

use chrono::{DateTime, Utc};

use geekshop_core::{Email, UserId, Username};

/// A shop account.
///
/// Deactivated accounts keep their row; `is_active` is the soft-delete flag.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Unique login name.
    pub username: Username,
    /// Contact address, if given.
    pub email: Option<Email>,
    /// Given name, if given.
    pub first_name: Option<String>,
    /// Age in years, if given.
    pub age: Option<i16>,
    /// Whether the account may log in.
    pub is_active: bool,
    /// Staff flag.
    pub is_staff: bool,
    /// Grants every admin operation.
    pub is_superuser: bool,
    /// When the account was created.
    pub date_joined: DateTime<Utc>,
}

/// Fields for inserting a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: Username,
    pub email: Option<Email>,
    pub first_name: Option<String>,
    pub age: Option<i16>,
    /// Argon2 PHC string.
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Fields for updating a user from the admin panel.
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub username: Username,
    pub email: Option<Email>,
    pub first_name: Option<String>,
    pub age: Option<i16>,
    /// `None` keeps the stored hash.
    pub password_hash: Option<String>,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

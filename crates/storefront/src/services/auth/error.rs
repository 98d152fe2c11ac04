//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] geekshop_core::EmailError),

    /// Invalid username format.
    #[error("invalid username: {0}")]
    InvalidUsername(#[from] geekshop_core::UsernameError),

    /// Wrong password, unknown user or deactivated account.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Username already taken.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or confirmation mismatch.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// First name wider than its column.
    #[error("first name must be at most {max} characters")]
    FirstNameTooLong { max: usize },

    /// Age outside 0-150.
    #[error("invalid age")]
    InvalidAge,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

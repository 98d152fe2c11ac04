//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! gs-cli user create-superuser -u admin -p 'long-password' -e admin@geekshop.local
//! ```

use thiserror::Error;

use geekshop_core::{UserId, Username, UsernameError};
use geekshop_storefront::db::{RepositoryError, UserRepository};
use geekshop_storefront::models::user::NewUser;
use geekshop_storefront::services::auth::{
    AuthError, hash_password, parse_optional_email, validate_password,
};

use super::ConnectError;

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Invalid username.
    #[error("Invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    /// Invalid email or password.
    #[error("{0}")]
    Invalid(#[from] AuthError),

    /// User already exists.
    #[error("User already exists: {0}")]
    UserExists(String),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Validate superuser details and hash the password.
///
/// # Errors
///
/// Returns `UserError::InvalidUsername` or `UserError::Invalid` for bad input.
pub fn superuser(username: &str, password: &str, email: Option<&str>) -> Result<NewUser, UserError> {
    let username = Username::parse(username)?;
    let email = parse_optional_email(email.unwrap_or_default())?;
    validate_password(password)?;

    Ok(NewUser {
        username,
        email,
        first_name: None,
        age: None,
        password_hash: hash_password(password)?,
        is_active: true,
        is_staff: true,
        is_superuser: true,
    })
}

/// Create a superuser account.
///
/// # Errors
///
/// Returns `UserError::UserExists` if the username is taken.
pub async fn create_superuser(
    username: &str,
    password: &str,
    email: Option<&str>,
) -> Result<UserId, UserError> {
    let new_user = superuser(username, password, email)?;
    let pool = super::connect().await?;

    tracing::info!("Creating superuser: {}", new_user.username);

    let user = UserRepository::new(&pool)
        .create(&new_user)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => UserError::UserExists(new_user.username.to_string()),
            other => UserError::Repository(other),
        })?;

    tracing::info!(
        "Superuser created successfully! ID: {}, Username: {}",
        user.id,
        user.username
    );

    Ok(user.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_superuser_flags() {
        let user = superuser("root", "correct horse battery", Some("root@geekshop.local"))
            .unwrap_or_else(|e| panic!("unexpected error: {e}"));

        assert!(user.is_active && user.is_staff && user.is_superuser);
        assert_eq!(user.username.as_str(), "root");
        assert!(user.password_hash.starts_with("$argon2id$"));
        assert!(user.email.is_some());
    }

    #[test]
    fn test_superuser_rejects_bad_input() {
        assert!(matches!(
            superuser("", "correct horse battery", None),
            Err(UserError::InvalidUsername(_))
        ));
        assert!(matches!(
            superuser("root", "short", None),
            Err(UserError::Invalid(AuthError::WeakPassword(_)))
        ));
        assert!(matches!(
            superuser("root", "correct horse battery", Some("no-at-sign")),
            Err(UserError::Invalid(AuthError::InvalidEmail(_)))
        ));
    }
}

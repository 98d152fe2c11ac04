//! Authentication service.
//!
//! Provides username/password registration and login.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::Deserialize;
use sqlx::PgPool;

use geekshop_core::{Email, Username};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::user::{NewUser, User};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Column width of `shop.users.first_name`.
pub const MAX_FIRST_NAME_LENGTH: usize = 150;

/// Maximum accepted age.
const MAX_AGE: i16 = 150;

/// Registration form data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Registration {
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub age: String,
    pub password: String,
    pub password_confirm: String,
}

impl Registration {
    /// Validate the form and hash the password.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure, or `AuthError::PasswordHash`.
    pub fn into_new_user(self) -> Result<NewUser, AuthError> {
        let username = Username::parse(&self.username)?;
        let email = parse_optional_email(&self.email)?;
        let first_name = parse_first_name(&self.first_name)?;
        let age = parse_age(&self.age)?;

        if self.password != self.password_confirm {
            return Err(AuthError::WeakPassword("passwords do not match".to_string()));
        }
        validate_password(&self.password)?;

        Ok(NewUser {
            username,
            email,
            first_name,
            age,
            password_hash: hash_password(&self.password)?,
            is_active: true,
            is_staff: false,
            is_superuser: false,
        })
    }
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new customer account.
    ///
    /// # Errors
    ///
    /// Returns a validation error from [`Registration::into_new_user`].
    /// Returns `AuthError::UserAlreadyExists` if the username is taken.
    pub async fn register(&self, registration: Registration) -> Result<User, AuthError> {
        let new_user = registration.into_new_user()?;

        self.users.create(&new_user).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
            other => AuthError::Repository(other),
        })
    }

    /// Login with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the user is unknown,
    /// deactivated, or the password is wrong.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let username = Username::parse(username).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_with_password_hash(&username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        if !user.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }
}

/// Validate password meets requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Parse an optional age field. Blank means not given.
///
/// # Errors
///
/// Returns `AuthError::InvalidAge` for non-numbers or values outside 0-150.
pub fn parse_age(raw: &str) -> Result<Option<i16>, AuthError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let age: i16 = raw.parse().map_err(|_| AuthError::InvalidAge)?;
    if !(0..=MAX_AGE).contains(&age) {
        return Err(AuthError::InvalidAge);
    }
    Ok(Some(age))
}

/// Parse an optional first name. Blank means not given.
///
/// # Errors
///
/// Returns `AuthError::FirstNameTooLong` past 150 characters.
pub fn parse_first_name(raw: &str) -> Result<Option<String>, AuthError> {
    let first_name = non_empty(raw);
    if first_name
        .as_ref()
        .is_some_and(|name| name.chars().count() > MAX_FIRST_NAME_LENGTH)
    {
        return Err(AuthError::FirstNameTooLong {
            max: MAX_FIRST_NAME_LENGTH,
        });
    }
    Ok(first_name)
}

/// Parse an optional email field. Blank means not given.
///
/// # Errors
///
/// Returns `AuthError::InvalidEmail` for malformed addresses.
pub fn parse_optional_email(raw: &str) -> Result<Option<Email>, AuthError> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(Email::parse(raw)?))
}

/// Trimmed value, or `None` when blank.
fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

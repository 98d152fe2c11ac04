//! User repository for database operations.

use sqlx::PgPool;

use geekshop_core::{UserId, Username};

use super::RepositoryError;
use crate::models::user::{NewUser, User, UserChanges};

const USER_COLUMNS: &str = "id, username, email, first_name, age, \
                            is_active, is_staff, is_superuser, date_joined";

/// Row used for password verification.
#[derive(sqlx::FromRow)]
struct UserWithHash {
    #[sqlx(flatten)]
    user: User,
    password_hash: String,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM shop.users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Get a user and password hash by username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_password_hash(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithHash>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM shop.users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| (r.user, r.password_hash)))
    }

    /// List every user for the admin panel.
    ///
    /// Active accounts come first, then superusers, then staff, then by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_admin(&self) -> Result<Vec<User>, RepositoryError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM shop.users \
             ORDER BY is_active DESC, is_superuser DESC, is_staff DESC, username"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(users)
    }

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let created = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO shop.users \
                 (username, email, first_name, age, password_hash, is_active, is_staff, is_superuser) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(user.age)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.is_staff)
        .bind(user.is_superuser)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "username already exists", "invalid reference"))?;

        Ok(created)
    }

    /// Update a user's profile and flags.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new username is taken.
    pub async fn update(&self, id: UserId, changes: &UserChanges) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.users
            SET username = $2,
                email = $3,
                first_name = $4,
                age = $5,
                password_hash = COALESCE($6, password_hash),
                is_active = $7,
                is_staff = $8,
                is_superuser = $9
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&changes.username)
        .bind(&changes.email)
        .bind(&changes.first_name)
        .bind(changes.age)
        .bind(&changes.password_hash)
        .bind(changes.is_active)
        .bind(changes.is_staff)
        .bind(changes.is_superuser)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "username already exists", "invalid reference"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Soft-delete a user.
    ///
    /// # Returns
    ///
    /// Returns `true` if the user exists, `false` otherwise.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn deactivate(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE shop.users SET is_active = FALSE WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

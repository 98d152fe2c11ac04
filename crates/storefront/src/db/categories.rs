//! Category repository.

use sqlx::PgPool;

use geekshop_core::CategoryId;

use super::RepositoryError;
use crate::models::catalog::{Category, CategoryInput};

const CATEGORY_COLUMNS: &str = "id, name, description, is_active, created_at";

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active categories ordered by name, for the catalog menu.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM shop.categories WHERE is_active ORDER BY name"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(categories)
    }

    /// Every category in id order, for the admin panel.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM shop.categories ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(categories)
    }

    /// Get a category by ID regardless of its flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM shop.categories WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(category)
    }

    /// Get a category only if it is active.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        Ok(self.get(id).await?.filter(|c| c.is_active))
    }

    /// Insert a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken.
    pub async fn create(&self, input: &CategoryInput) -> Result<Category, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "INSERT INTO shop.categories (name, description, is_active) \
             VALUES ($1, $2, $3) \
             RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.is_active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "category name already exists", "invalid reference"))?;

        Ok(category)
    }

    /// Update a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    /// Returns `RepositoryError::Conflict` if the name is taken.
    pub async fn update(&self, id: CategoryId, input: &CategoryInput) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.categories SET name = $2, description = $3, is_active = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.is_active)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "category name already exists", "invalid reference"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Soft-delete a category.
    ///
    /// Returns `false` if no such category exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn deactivate(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE shop.categories SET is_active = FALSE WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

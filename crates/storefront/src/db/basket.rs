//! Basket repository.
//!
//! Every query is scoped by the owning `UserId`. A line that belongs to
//! somebody else behaves exactly like a line that does not exist.

use sqlx::PgPool;

use geekshop_core::{BasketLineId, ProductId, Quantity, QuantityUpdate, UserId};

use super::RepositoryError;
use crate::models::basket::BasketLine;

/// Repository for basket database operations.
pub struct BasketRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BasketRepository<'a> {
    /// Create a new basket repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A user's lines ordered by category name, then line id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, user_id: UserId) -> Result<Vec<BasketLine>, RepositoryError> {
        let lines = sqlx::query_as::<_, BasketLine>(
            r"
            SELECT b.id, b.product_id, p.name AS product_name, c.name AS category_name,
                   p.price, b.quantity
            FROM shop.basket b
            JOIN shop.products p ON p.id = b.product_id
            JOIN shop.categories c ON c.id = p.category_id
            WHERE b.user_id = $1
            ORDER BY c.name, b.id
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(lines)
    }

    /// Add one unit of a visible product, creating the line if needed.
    ///
    /// Returns the line's new quantity, which never exceeds [`Quantity::MAX`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product is missing or not visible.
    pub async fn add_one(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Quantity, RepositoryError> {
        let row: Option<(i32,)> = sqlx::query_as(
            r"
            INSERT INTO shop.basket AS b (user_id, product_id, quantity)
            SELECT $1, p.id, 1
            FROM shop.products p
            JOIN shop.categories c ON c.id = p.category_id
            WHERE p.id = $2 AND p.is_active AND c.is_active
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = LEAST(b.quantity, $3 - 1) + 1
            RETURNING b.quantity
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(Quantity::MAX.get())
        .fetch_optional(self.pool)
        .await?;

        let (quantity,) = row.ok_or(RepositoryError::NotFound)?;
        Quantity::new(quantity).map_err(|e| RepositoryError::DataCorruption(e.to_string()))
    }

    /// Delete one of the user's lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user owns no such line.
    pub async fn remove(&self, user_id: UserId, line_id: BasketLineId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.basket WHERE id = $1 AND user_id = $2")
            .bind(line_id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Apply a quantity edit to one of the user's lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user owns no such line.
    pub async fn apply(
        &self,
        user_id: UserId,
        line_id: BasketLineId,
        update: QuantityUpdate,
    ) -> Result<(), RepositoryError> {
        let quantity = match update {
            QuantityUpdate::Remove => return self.remove(user_id, line_id).await,
            QuantityUpdate::Set(quantity) => quantity,
        };

        let result =
            sqlx::query("UPDATE shop.basket SET quantity = $3 WHERE id = $1 AND user_id = $2")
                .bind(line_id)
                .bind(user_id)
                .bind(quantity.get())
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

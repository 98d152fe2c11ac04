//! Product repository.
//!
//! Storefront reads only see *visible* products: active, in an active
//! category. Admin reads see everything.

use sqlx::PgPool;

use geekshop_core::{CategoryId, ProductId};

use super::RepositoryError;
use crate::models::catalog::{Product, ProductInput};

const PRODUCT_SELECT: &str = "SELECT p.id, p.category_id, c.name AS category_name, p.name, \
                              p.short_desc, p.description, p.price, p.quantity, \
                              p.is_active, p.created_at \
                              FROM shop.products p \
                              JOIN shop.categories c ON c.id = p.category_id";

const VISIBLE: &str = "p.is_active AND c.is_active";

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The first `limit` visible products by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn first_visible(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "{PRODUCT_SELECT} WHERE {VISIBLE} ORDER BY p.id LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Visible products ordered by price, then id.
    ///
    /// [`CategoryId::ALL`] lists every category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_visible_by_price(
        &self,
        category: CategoryId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "{PRODUCT_SELECT} WHERE {VISIBLE} AND ($1 = 0 OR p.category_id = $1) \
             ORDER BY p.price, p.id"
        ))
        .bind(category)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Get a product if it is visible.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_visible(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "{PRODUCT_SELECT} WHERE {VISIBLE} AND p.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Number of visible products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_visible(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM shop.products p \
             JOIN shop.categories c ON c.id = p.category_id WHERE {VISIBLE}"
        ))
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// The visible product at `offset` in id order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn visible_at(&self, offset: i64) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "{PRODUCT_SELECT} WHERE {VISIBLE} ORDER BY p.id OFFSET $1 LIMIT 1"
        ))
        .bind(offset)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Up to `limit` other visible products in the same category, by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn related(
        &self,
        product: &Product,
        limit: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "{PRODUCT_SELECT} WHERE {VISIBLE} AND p.category_id = $1 AND p.id <> $2 \
             ORDER BY p.id LIMIT $3"
        ))
        .bind(product.category_id)
        .bind(product.id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Every product ordered by category name then product name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_admin(
        &self,
        category: Option<CategoryId>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "{PRODUCT_SELECT} WHERE ($1::INTEGER IS NULL OR p.category_id = $1) \
             ORDER BY c.name, p.name, p.id"
        ))
        .bind(category)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Get a product by ID regardless of visibility.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!("{PRODUCT_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(product)
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the category does not exist.
    pub async fn create(&self, input: &ProductInput) -> Result<ProductId, RepositoryError> {
        let (id,): (ProductId,) = sqlx::query_as(
            r"
            INSERT INTO shop.products
                (category_id, name, short_desc, description, price, quantity, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            ",
        )
        .bind(input.category_id)
        .bind(&input.name)
        .bind(&input.short_desc)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.quantity)
        .bind(input.is_active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "duplicate product", "category does not exist"))?;

        Ok(id)
    }

    /// Update a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Conflict` if the category does not exist.
    pub async fn update(&self, id: ProductId, input: &ProductInput) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.products
            SET category_id = $2,
                name = $3,
                short_desc = $4,
                description = $5,
                price = $6,
                quantity = $7,
                is_active = $8
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(input.category_id)
        .bind(&input.name)
        .bind(&input.short_desc)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.quantity)
        .bind(input.is_active)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "duplicate product", "category does not exist"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Soft-delete a product.
    ///
    /// Returns `false` if no such product exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn deactivate(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE shop.products SET is_active = FALSE WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

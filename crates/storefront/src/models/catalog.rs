//! Catalog types: categories and products.

use chrono::{DateTime, Utc};

use geekshop_core::{CategoryId, Price, ProductId};

/// A product category.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting or updating a category.
#[derive(Debug, Clone)]
pub struct CategoryInput {
    pub name: String,
    pub description: String,
    pub is_active: bool,
}

impl CategoryInput {
    /// Column width of `shop.categories.name`.
    pub const MAX_NAME_LENGTH: usize = 64;
}

/// A product joined with its category name.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub category_name: String,
    pub name: String,
    pub short_desc: String,
    pub description: String,
    pub price: Price,
    /// Units in stock.
    pub quantity: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting or updating a product.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub category_id: CategoryId,
    pub name: String,
    pub short_desc: String,
    pub description: String,
    pub price: Price,
    pub quantity: i32,
    pub is_active: bool,
}

impl ProductInput {
    /// Column width of `shop.products.name`.
    pub const MAX_NAME_LENGTH: usize = 128;
    /// Column width of `shop.products.short_desc`.
    pub const MAX_SHORT_DESC_LENGTH: usize = 64;
}

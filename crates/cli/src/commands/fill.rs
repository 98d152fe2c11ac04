//! Load the catalog seed and create the superuser.
//!
//! # Usage
//!
//! ```bash
//! gs-cli fill fixtures/ -p 'long-password'
//! gs-cli fill fixtures/ -u root -p 'long-password' -e root@geekshop.local
//! ```
//!
//! The directory must contain `categories.json` and `products.json`.
//! Everything runs in one transaction: existing products and categories are
//! replaced (basket lines cascade), and an existing superuser is left alone.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use sqlx::{Postgres, Transaction};
use thiserror::Error;

use geekshop_core::{CategoryId, Price, PriceError};
use geekshop_storefront::models::user::NewUser;

use super::ConnectError;
use super::user::{UserError, superuser};

/// Category seed file name.
pub const CATEGORIES_FILE: &str = "categories.json";
/// Product seed file name.
pub const PRODUCTS_FILE: &str = "products.json";

/// Errors that can occur while loading the seed.
#[derive(Debug, Error)]
pub enum FillError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid JSON in {file}: {source}")]
    Json {
        file: &'static str,
        source: serde_json::Error,
    },

    #[error("Product {product:?} refers to unknown category {category:?}")]
    UnknownCategory { product: String, category: String },

    #[error("Product {product:?} has an invalid price: {source}")]
    InvalidPrice { product: String, source: PriceError },

    #[error("Product {product:?} has a negative quantity")]
    NegativeQuantity { product: String },

    #[error(transparent)]
    Superuser(#[from] UserError),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

const fn yes() -> bool {
    true
}

/// One entry of `categories.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct CategorySeed {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "yes")]
    pub is_active: bool,
}

/// Price as written in the seed: `"12.50"` or `12.5`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SeedPrice {
    Text(String),
    Number(serde_json::Number),
}

impl SeedPrice {
    fn parse(&self) -> Result<Price, PriceError> {
        match self {
            Self::Text(text) => text.parse(),
            Self::Number(number) => number.to_string().parse(),
        }
    }
}

/// One entry of `products.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductSeed {
    /// Category name.
    pub category: String,
    pub name: String,
    #[serde(default)]
    pub short_desc: String,
    #[serde(default)]
    pub description: String,
    pub price: SeedPrice,
    #[serde(default)]
    pub quantity: i32,
    #[serde(default = "yes")]
    pub is_active: bool,
}

/// A product ready to insert.
#[derive(Debug, Clone)]
pub struct SeedProduct {
    pub category: String,
    pub name: String,
    pub short_desc: String,
    pub description: String,
    pub price: Price,
    pub quantity: i32,
    pub is_active: bool,
}

/// A validated seed.
#[derive(Debug, Clone)]
pub struct Seed {
    pub categories: Vec<CategorySeed>,
    pub products: Vec<SeedProduct>,
}

/// Counts reported after a fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillSummary {
    pub categories: usize,
    pub products: usize,
    pub superuser_created: bool,
}

/// Parse and validate both seed documents.
///
/// # Errors
///
/// Returns `FillError::Json` for malformed documents and a product error for
/// unknown categories, bad prices or negative quantities.
pub fn parse_seed(categories_json: &str, products_json: &str) -> Result<Seed, FillError> {
    let categories: Vec<CategorySeed> =
        serde_json::from_str(categories_json).map_err(|source| FillError::Json {
            file: CATEGORIES_FILE,
            source,
        })?;
    let raw_products: Vec<ProductSeed> =
        serde_json::from_str(products_json).map_err(|source| FillError::Json {
            file: PRODUCTS_FILE,
            source,
        })?;

    let products = raw_products
        .into_iter()
        .map(|p| {
            if !categories.iter().any(|c| c.name == p.category) {
                return Err(FillError::UnknownCategory {
                    product: p.name,
                    category: p.category,
                });
            }
            let price = p.price.parse().map_err(|source| FillError::InvalidPrice {
                product: p.name.clone(),
                source,
            })?;
            if p.quantity < 0 {
                return Err(FillError::NegativeQuantity { product: p.name });
            }

            Ok(SeedProduct {
                category: p.category,
                name: p.name,
                short_desc: p.short_desc,
                description: p.description,
                price,
                quantity: p.quantity,
                is_active: p.is_active,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Seed {
        categories,
        products,
    })
}

/// Read and validate the seed files in `dir`.
///
/// # Errors
///
/// Returns `FillError::Io` if a file cannot be read, or a parse error.
pub async fn load_seed(dir: &Path) -> Result<Seed, FillError> {
    let read = |name: &str| {
        let path = dir.join(name);
        async move {
            tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| FillError::Io { path, source })
        }
    };

    let categories = read(CATEGORIES_FILE).await?;
    let products = read(PRODUCTS_FILE).await?;

    parse_seed(&categories, &products)
}

/// Replace the catalog with the seed in `dir` and create the superuser.
///
/// # Errors
///
/// Returns an error if the seed is invalid or any statement fails; nothing
/// is written in that case.
pub async fn run(
    dir: &Path,
    username: &str,
    password: &str,
    email: Option<&str>,
) -> Result<FillSummary, FillError> {
    tracing::info!(path = %dir.display(), "Loading seed");
    let seed = load_seed(dir).await?;
    let admin = superuser(username, password, email)?;

    tracing::info!(
        categories = seed.categories.len(),
        products = seed.products.len(),
        "Parsed seed"
    );

    let pool = super::connect().await?;
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM shop.products").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM shop.categories").execute(&mut *tx).await?;

    let category_ids = insert_categories(&mut tx, &seed.categories).await?;
    insert_products(&mut tx, &seed.products, &category_ids).await?;
    let superuser_created = insert_superuser(&mut tx, &admin).await?;

    tx.commit().await?;

    if superuser_created {
        tracing::info!("Superuser {} created", admin.username);
    } else {
        tracing::warn!("User {} already exists, superuser not created", admin.username);
    }

    let summary = FillSummary {
        categories: seed.categories.len(),
        products: seed.products.len(),
        superuser_created,
    };
    tracing::info!(?summary, "Seeding complete!");

    Ok(summary)
}

async fn insert_categories(
    tx: &mut Transaction<'_, Postgres>,
    categories: &[CategorySeed],
) -> Result<HashMap<String, CategoryId>, FillError> {
    let mut ids = HashMap::with_capacity(categories.len());

    for category in categories {
        let (id,): (CategoryId,) = sqlx::query_as(
            "INSERT INTO shop.categories (name, description, is_active) \
             VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.is_active)
        .fetch_one(&mut **tx)
        .await?;

        ids.insert(category.name.clone(), id);
    }

    Ok(ids)
}

async fn insert_products(
    tx: &mut Transaction<'_, Postgres>,
    products: &[SeedProduct],
    category_ids: &HashMap<String, CategoryId>,
) -> Result<(), FillError> {
    for product in products {
        let category_id =
            category_ids
                .get(&product.category)
                .ok_or_else(|| FillError::UnknownCategory {
                    product: product.name.clone(),
                    category: product.category.clone(),
                })?;

        sqlx::query(
            "INSERT INTO shop.products \
                 (category_id, name, short_desc, description, price, quantity, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(category_id)
        .bind(&product.name)
        .bind(&product.short_desc)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.quantity)
        .bind(product.is_active)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

/// Insert the superuser unless the username is taken. Returns whether it was created.
async fn insert_superuser(
    tx: &mut Transaction<'_, Postgres>,
    user: &NewUser,
) -> Result<bool, FillError> {
    let created: Option<(i32,)> = sqlx::query_as(
        "INSERT INTO shop.users \
             (username, email, first_name, age, password_hash, is_active, is_staff, is_superuser) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         ON CONFLICT (username) DO NOTHING \
         RETURNING id",
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.first_name)
    .bind(user.age)
    .bind(&user.password_hash)
    .bind(user.is_active)
    .bind(user.is_staff)
    .bind(user.is_superuser)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(created.is_some())
}

//! Featured product selection.

use rand::Rng;
use sqlx::PgPool;

use crate::db::{ProductRepository, RepositoryError};
use crate::models::Product;

/// Number of related products shown next to the featured one.
pub const RELATED_LIMIT: i64 = 3;

/// A featured product and others from its category.
#[derive(Debug, Clone)]
pub struct Featured {
    pub product: Product,
    pub related: Vec<Product>,
}

/// Pick a uniform offset into `count` rows.
///
/// Returns `None` when there is nothing to pick from.
pub fn pick_offset<R: Rng>(count: i64, rng: &mut R) -> Option<i64> {
    (count > 0).then(|| rng.random_range(0..count))
}

/// Choose a random visible product and up to three related ones.
///
/// Returns `None` for an empty catalog.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn featured(pool: &PgPool) -> Result<Option<Featured>, RepositoryError> {
    let products = ProductRepository::new(pool);

    let count = products.count_visible().await?;
    let Some(offset) = pick_offset(count, &mut rand::rng()) else {
        return Ok(None);
    };

    // A concurrent deactivation can shrink the catalog between the two reads
    let Some(product) = products.visible_at(offset).await? else {
        return Ok(None);
    };

    let related = products.related(&product, RELATED_LIMIT).await?;

    Ok(Some(Featured { product, related }))
}

//! CLI subcommands.

pub mod fill;
pub mod migrate;
pub mod user;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Variables checked, in order, for the database connection string.
const DATABASE_URL_VARS: [&str; 2] = ["GEEKSHOP_DATABASE_URL", "DATABASE_URL"];

/// Errors that can occur while connecting to the shop database.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Neither database URL variable is set.
    #[error("Missing environment variable: {}", DATABASE_URL_VARS[0])]
    MissingEnvVar,

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Connect to the shop database named by the environment.
///
/// # Errors
///
/// Returns `ConnectError::MissingEnvVar` if no URL is configured.
pub async fn connect() -> Result<PgPool, ConnectError> {
    dotenvy::dotenv().ok();

    let database_url = DATABASE_URL_VARS
        .iter()
        .find_map(|key| std::env::var(key).ok())
        .map(SecretString::from)
        .ok_or(ConnectError::MissingEnvVar)?;

    tracing::info!("Connecting to shop database...");
    Ok(geekshop_storefront::db::create_pool(&database_url).await?)
}

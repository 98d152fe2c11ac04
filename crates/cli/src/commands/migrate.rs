//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! gs-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `GEEKSHOP_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! Migration files live in `crates/storefront/migrations/` and are embedded
//! into the storefront library.

use thiserror::Error;

use geekshop_storefront::db::MIGRATOR;

use super::ConnectError;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let pool = super::connect().await?;

    tracing::info!(
        available = MIGRATOR.iter().count(),
        "Running shop migrations..."
    );
    MIGRATOR.run(&pool).await?;

    tracing::info!("Shop migrations complete!");
    Ok(())
}

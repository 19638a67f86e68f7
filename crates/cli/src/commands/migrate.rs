//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! kl-cli migrate
//! ```
//!
//! Applies every pending file in `migrations/` (schema, then the session
//! tables used by both web apps). Already-applied migrations are skipped.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string

use thiserror::Error;

use super::{DATABASE_URL_VAR, connect, database_url};

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A migration failed or the history does not match the files.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run all pending migrations.
///
/// # Errors
///
/// Returns an error if `DATABASE_URL` is unset, the database is unreachable
/// or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let database_url =
        database_url().ok_or(MigrationError::MissingEnvVar(DATABASE_URL_VAR))?;
    let pool = connect(&database_url).await?;

    let migrator = sqlx::migrate!("../../migrations");
    tracing::info!(available = migrator.iter().count(), "Running migrations...");
    migrator.run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}

//! Subcommand implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;

/// Environment variable holding the `PostgreSQL` connection string.
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";

/// Read `DATABASE_URL`, loading `.env` first.
pub fn database_url() -> Option<SecretString> {
    dotenvy::dotenv().ok();
    std::env::var(DATABASE_URL_VAR).ok().map(SecretString::from)
}

/// Connect with the admin pool settings.
pub async fn connect(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    tracing::info!("Connecting to database...");
    kilala_admin::db::create_pool(database_url).await
}

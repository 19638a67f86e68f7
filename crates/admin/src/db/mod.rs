//! Database operations for the admin API.
//!
//! # Database
//!
//! The admin API shares the storefront's `PostgreSQL` database and has write
//! access to every table.
//!
//! ## Tables used here
//!
//! - `products`, `product_images`, `product_attributes`, `product_tags`
//! - `categories`, `collections`, `tags`
//! - `users` - Customer and admin accounts
//! - `orders`, `order_items`
//! - `reviews`
//! - `posts`
//! - `tower_sessions.admin_session` - Admin session storage
//!
//! # Migrations
//!
//! Migrations are stored in `migrations/` at the workspace root and run via:
//! ```bash
//! cargo run -p kilala-cli -- migrate
//! ```

pub mod dashboard;
pub mod images;
pub mod orders;
pub mod posts;
pub mod products;
pub mod reviews;
pub mod search;
pub mod taxonomy;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use dashboard::DashboardRepository;
pub use images::ImageRepository;
pub use orders::OrderRepository;
pub use posts::PostRepository;
pub use products::ProductRepository;
pub use reviews::ReviewRepository;
pub use search::SearchRepository;
pub use taxonomy::{CategoryRepository, CollectionRepository, TagRepository};
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate slug).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map constraint violations to `Conflict`, anything else to `Database`.
    ///
    /// `what` names the field users see in the message, e.g. `"Slug"`.
    pub(crate) fn from_unique(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return Self::Conflict(format!("{what} đã tồn tại"));
            }
            if db_err.is_foreign_key_violation() {
                return Self::Conflict("Dữ liệu liên kết không tồn tại".to_string());
            }
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Escape `%`, `_` and `\` so user input can be embedded in an `ILIKE` pattern.
#[must_use]
pub fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// `NotFound` when an `UPDATE` or `DELETE` touched nothing.
pub(crate) fn rows_affected_or_not_found(rows: u64) -> Result<(), RepositoryError> {
    if rows == 0 {
        Err(RepositoryError::NotFound)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_wraps_and_escapes() {
        assert_eq!(like_pattern("KL2503"), "%KL2503%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
    }

    #[test]
    fn test_rows_affected_or_not_found() {
        assert!(rows_affected_or_not_found(1).is_ok());
        assert!(matches!(
            rows_affected_or_not_found(0),
            Err(RepositoryError::NotFound)
        ));
    }
}

//! Database operations for the storefront.
//!
//! # Database
//!
//! The storefront and admin share one `PostgreSQL` database. The storefront
//! reads the catalog and blog, and writes users, orders and reviews.
//!
//! ## Tables used here
//!
//! - `products`, `product_images`, `product_attributes`, `product_tags`
//! - `categories`, `collections`, `tags`
//! - `users` - Customer accounts
//! - `orders`, `order_items`
//! - `reviews`
//! - `posts`
//! - `tower_sessions.session` - Session storage
//!
//! # Migrations
//!
//! Migrations are stored in `migrations/` at the workspace root and run via:
//! ```bash
//! cargo run -p kilala-cli -- migrate
//! ```

pub mod catalog;
pub mod orders;
pub mod posts;
pub mod products;
pub mod reviews;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use catalog::CatalogRepository;
pub use orders::OrderRepository;
pub use posts::PostRepository;
pub use products::ProductRepository;
pub use reviews::ReviewRepository;
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

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A referenced row (user, product) was deleted concurrently.
    #[error("missing reference: {0}")]
    MissingReference(String),
}

impl RepositoryError {
    /// Map a unique violation to `Conflict`, a foreign key violation to
    /// `MissingReference`, anything else to `Database`.
    pub(crate) fn from_unique(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return Self::Conflict(format!("{what} already exists"));
            }
            if db_err.is_foreign_key_violation() {
                return Self::MissingReference(format!(
                    "{what} refers to a deleted row ({})",
                    db_err.constraint().unwrap_or("unknown constraint")
                ));
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
        .max_connections(10)
        .min_connections(2)
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

#[cfg(test)]
mod tests {
    use std::borrow::Cow;
    use std::error::Error as StdError;

    use sqlx::error::{DatabaseError, ErrorKind};

    use super::*;

    #[derive(Debug)]
    struct FakeDbError(ErrorKind);

    impl std::fmt::Display for FakeDbError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self.0)
        }
    }

    impl StdError for FakeDbError {}

    impl DatabaseError for FakeDbError {
        fn message(&self) -> &str {
            "constraint violated"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            None
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn constraint(&self) -> Option<&str> {
            Some("orders_user_id_fkey")
        }

        fn kind(&self) -> ErrorKind {
            match &self.0 {
                ErrorKind::UniqueViolation => ErrorKind::UniqueViolation,
                ErrorKind::ForeignKeyViolation => ErrorKind::ForeignKeyViolation,
                _ => ErrorKind::Other,
            }
        }
    }

    fn db_error(kind: ErrorKind) -> sqlx::Error {
        sqlx::Error::Database(Box::new(FakeDbError(kind)))
    }

    #[test]
    fn test_constraint_violations_are_classified() {
        assert!(matches!(
            RepositoryError::from_unique(db_error(ErrorKind::UniqueViolation), "email"),
            RepositoryError::Conflict(_)
        ));
        assert!(matches!(
            RepositoryError::from_unique(db_error(ErrorKind::ForeignKeyViolation), "order"),
            RepositoryError::MissingReference(msg) if msg.contains("orders_user_id_fkey")
        ));
        assert!(matches!(
            RepositoryError::from_unique(db_error(ErrorKind::Other), "order"),
            RepositoryError::Database(_)
        ));
        assert!(matches!(
            RepositoryError::from_unique(sqlx::Error::RowNotFound, "order"),
            RepositoryError::Database(_)
        ));
    }

    #[test]
    fn test_like_pattern_wraps_and_escapes() {
        assert_eq!(like_pattern("lens"), "%lens%");
        assert_eq!(like_pattern(" 50% off "), "%50\\% off%");
        assert_eq!(like_pattern("a_b\\c"), "%a\\_b\\\\c%");
    }
}

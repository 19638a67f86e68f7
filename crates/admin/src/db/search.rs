//! Cross-entity quick search for the admin header.

use kilala_core::{CategoryId, OrderId, OrderStatus, PostId, ProductId, UserId};
use serde::Serialize;
use sqlx::PgPool;

use super::{RepositoryError, like_pattern};

/// Shortest query that triggers a search.
pub const MIN_QUERY_CHARS: usize = 2;

/// Results per entity group.
const GROUP_LIMIT: i64 = 5;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductHit {
    pub id: ProductId,
    pub name: String,
    pub sku: Option<String>,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderHit {
    pub id: OrderId,
    pub code: String,
    pub customer_name: String,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserHit {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PostHit {
    pub id: PostId,
    pub title: String,
    pub is_published: bool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategoryHit {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

/// Search results grouped by entity.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResults {
    pub products: Vec<ProductHit>,
    pub orders: Vec<OrderHit>,
    pub users: Vec<UserHit>,
    pub posts: Vec<PostHit>,
    pub categories: Vec<CategoryHit>,
}

/// The trimmed query if it is long enough to search for.
#[must_use]
pub fn searchable(q: &str) -> Option<&str> {
    let q = q.trim();
    (q.chars().count() >= MIN_QUERY_CHARS).then_some(q)
}

/// Repository for quick search.
pub struct SearchRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SearchRepository<'a> {
    /// Create a new search repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Up to five matches per entity. Short queries return empty groups.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn search(&self, q: &str) -> Result<SearchResults, RepositoryError> {
        let Some(q) = searchable(q) else {
            return Ok(SearchResults::default());
        };
        let pattern = like_pattern(q);

        let (products, orders, users, posts, categories) = tokio::try_join!(
            sqlx::query_as::<_, ProductHit>(
                "SELECT id, name, sku, slug FROM products \
                 WHERE name ILIKE $1 OR sku ILIKE $1 OR slug ILIKE $1 \
                 ORDER BY name LIMIT $2",
            )
            .bind(&pattern)
            .bind(GROUP_LIMIT)
            .fetch_all(self.pool),
            sqlx::query_as::<_, OrderHit>(
                "SELECT id, code, customer_name, status FROM orders \
                 WHERE code ILIKE $1 OR customer_name ILIKE $1 OR email ILIKE $1 \
                    OR phone ILIKE $1 \
                 ORDER BY created_at DESC LIMIT $2",
            )
            .bind(&pattern)
            .bind(GROUP_LIMIT)
            .fetch_all(self.pool),
            sqlx::query_as::<_, UserHit>(
                "SELECT id, email, name, phone FROM users \
                 WHERE email ILIKE $1 OR name ILIKE $1 OR phone ILIKE $1 \
                 ORDER BY name LIMIT $2",
            )
            .bind(&pattern)
            .bind(GROUP_LIMIT)
            .fetch_all(self.pool),
            sqlx::query_as::<_, PostHit>(
                "SELECT id, title, is_published FROM posts \
                 WHERE title ILIKE $1 ORDER BY created_at DESC LIMIT $2",
            )
            .bind(&pattern)
            .bind(GROUP_LIMIT)
            .fetch_all(self.pool),
            sqlx::query_as::<_, CategoryHit>(
                "SELECT id, name, slug FROM categories \
                 WHERE name ILIKE $1 ORDER BY position, name LIMIT $2",
            )
            .bind(&pattern)
            .bind(GROUP_LIMIT)
            .fetch_all(self.pool),
        )?;

        Ok(SearchResults {
            products,
            orders,
            users,
            posts,
            categories,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_searchable_requires_two_chars() {
        assert_eq!(searchable(""), None);
        assert_eq!(searchable("  a "), None);
        assert_eq!(searchable("đ"), None);
        assert_eq!(searchable(" kl "), Some("kl"));
        assert_eq!(searchable("lens xám"), Some("lens xám"));
    }
}

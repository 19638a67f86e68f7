//! Product reviews.

use chrono::{DateTime, Utc};
use kilala_core::models::Review;
use kilala_core::{Page, PageParams, ProductId, ReviewId, UserId};
use serde::Serialize;
use sqlx::PgPool;

use super::RepositoryError;

/// An approved review with the reviewer's display name.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ReviewView {
    pub id: ReviewId,
    pub rating: i16,
    pub comment: Option<String>,
    pub reviewer_name: String,
    pub created_at: DateTime<Utc>,
}

/// Repository for reviews.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Approved reviews of a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_approved(
        &self,
        product_id: ProductId,
        params: &PageParams,
    ) -> Result<Page<ReviewView>, RepositoryError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM reviews WHERE product_id = $1 AND is_approved",
        )
        .bind(product_id)
        .fetch_one(self.pool)
        .await?;

        let items = sqlx::query_as::<_, ReviewView>(
            "SELECT r.id, r.rating, r.comment, u.name AS reviewer_name, r.created_at \
             FROM reviews r JOIN users u ON u.id = r.user_id \
             WHERE r.product_id = $1 AND r.is_approved \
             ORDER BY r.created_at DESC, r.id DESC LIMIT $2 OFFSET $3",
        )
        .bind(product_id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(Page::new(items, params, total))
    }

    /// Whether the user already reviewed the product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_reviewed(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM reviews WHERE user_id = $1 AND product_id = $2)",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Create a review. New reviews are visible immediately.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already reviewed the product.
    pub async fn create(
        &self,
        user_id: UserId,
        product_id: ProductId,
        rating: i16,
        comment: Option<&str>,
    ) -> Result<Review, RepositoryError> {
        sqlx::query_as::<_, Review>(
            "INSERT INTO reviews (product_id, user_id, rating, comment) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, product_id, user_id, rating, comment, is_approved, created_at",
        )
        .bind(product_id)
        .bind(user_id)
        .bind(rating)
        .bind(comment)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "review"))
    }
}

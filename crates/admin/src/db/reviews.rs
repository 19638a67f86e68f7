//! Review moderation.

use kilala_core::models::Review;
use kilala_core::{Page, PageParams, ProductId, ReviewId};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{RepositoryError, rows_affected_or_not_found};

/// Filters for the review listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewFilter {
    pub product_id: Option<ProductId>,
    pub is_approved: Option<bool>,
}

/// A review with the product and reviewer it belongs to.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ReviewRow {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub review: Review,
    pub product_name: String,
    pub product_slug: String,
    pub user_name: String,
    pub user_email: String,
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &ReviewFilter) {
    if let Some(product_id) = filter.product_id {
        builder.push(" AND r.product_id = ").push_bind(product_id);
    }
    if let Some(is_approved) = filter.is_approved {
        builder.push(" AND r.is_approved = ").push_bind(is_approved);
    }
}

/// Repository for review moderation.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Reviews matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &ReviewFilter,
        params: &PageParams,
    ) -> Result<Page<ReviewRow>, RepositoryError> {
        let mut count =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM reviews r WHERE TRUE");
        push_filters(&mut count, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT r.id, r.product_id, r.user_id, r.rating, r.comment, r.is_approved, \
             r.created_at, p.name AS product_name, p.slug AS product_slug, \
             u.name AS user_name, u.email AS user_email \
             FROM reviews r \
             JOIN products p ON p.id = r.product_id \
             JOIN users u ON u.id = r.user_id \
             WHERE TRUE",
        );
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY r.created_at DESC, r.id DESC LIMIT ")
            .push_bind(params.limit())
            .push(" OFFSET ")
            .push_bind(params.offset());

        let items = query.build_query_as::<ReviewRow>().fetch_all(self.pool).await?;
        Ok(Page::new(items, params, total))
    }

    /// Approve or hide a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review does not exist.
    pub async fn set_approved(
        &self,
        id: ReviewId,
        is_approved: bool,
    ) -> Result<Review, RepositoryError> {
        let review = sqlx::query_as::<_, Review>(
            "UPDATE reviews SET is_approved = $2 WHERE id = $1 \
             RETURNING id, product_id, user_id, rating, comment, is_approved, created_at",
        )
        .bind(id)
        .bind(is_approved)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        tracing::info!(review_id = %id, is_approved, "Review moderated");
        Ok(review)
    }

    /// Delete a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review does not exist.
    pub async fn delete(&self, id: ReviewId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        rows_affected_or_not_found(result.rows_affected())
    }
}

//! Published blog post reads.

use chrono::{DateTime, Utc};
use kilala_core::models::Post;
use kilala_core::{Page, PageParams, PostId};
use serde::Serialize;
use sqlx::PgPool;

use super::RepositoryError;

/// Post summary for listings.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PostSummary {
    pub id: PostId,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub author_name: Option<String>,
}

const SUMMARY_SELECT: &str = "SELECT p.id, p.title, p.slug, p.excerpt, p.cover_image, \
    p.published_at, u.name AS author_name \
    FROM posts p LEFT JOIN users u ON u.id = p.author_id \
    WHERE p.is_published";

/// Repository for blog posts.
pub struct PostRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PostRepository<'a> {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Published posts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_published(
        &self,
        params: &PageParams,
    ) -> Result<Page<PostSummary>, RepositoryError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts WHERE is_published")
            .fetch_one(self.pool)
            .await?;

        let items = sqlx::query_as::<_, PostSummary>(&format!(
            "{SUMMARY_SELECT} ORDER BY p.published_at DESC NULLS LAST, p.id DESC \
             LIMIT $1 OFFSET $2"
        ))
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(Page::new(items, params, total))
    }

    /// Latest published posts for the home page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn latest(&self, limit: i64) -> Result<Vec<PostSummary>, RepositoryError> {
        let items = sqlx::query_as::<_, PostSummary>(&format!(
            "{SUMMARY_SELECT} ORDER BY p.published_at DESC NULLS LAST, p.id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// A published post with its author's name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_published(
        &self,
        slug: &str,
    ) -> Result<Option<(Post, Option<String>)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct Row {
            #[sqlx(flatten)]
            post: Post,
            author_name: Option<String>,
        }

        let row = sqlx::query_as::<_, Row>(
            "SELECT p.id, p.title, p.slug, p.excerpt, p.content, p.cover_image, \
                p.is_published, p.published_at, p.author_id, p.created_at, p.updated_at, \
                u.name AS author_name \
             FROM posts p LEFT JOIN users u ON u.id = p.author_id \
             WHERE p.slug = $1 AND p.is_published",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| (r.post, r.author_name)))
    }
}

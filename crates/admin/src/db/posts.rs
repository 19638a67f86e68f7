//! Blog post administration.

use kilala_core::models::Post;
use kilala_core::{Page, PageParams, PostId, UserId};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{RepositoryError, like_pattern, rows_affected_or_not_found};
use crate::services::content::ValidPost;

const POST_COLUMNS: &str = "id, title, slug, excerpt, content, cover_image, is_published, \
    published_at, author_id, created_at, updated_at";

/// Filters for the post listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostFilter {
    /// Matches the title.
    pub q: Option<String>,
    pub is_published: Option<bool>,
}

/// A post with its author's name.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PostRow {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub post: Post,
    pub author_name: Option<String>,
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &PostFilter) {
    if let Some(is_published) = filter.is_published {
        builder.push(" AND p.is_published = ").push_bind(is_published);
    }
    if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        builder.push(" AND p.title ILIKE ").push_bind(like_pattern(q));
    }
}

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

    /// Posts matching `filter`, drafts included, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &PostFilter,
        params: &PageParams,
    ) -> Result<Page<PostRow>, RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts p WHERE TRUE");
        push_filters(&mut count, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT p.id, p.title, p.slug, p.excerpt, p.content, p.cover_image, \
             p.is_published, p.published_at, p.author_id, p.created_at, p.updated_at, \
             u.name AS author_name \
             FROM posts p LEFT JOIN users u ON u.id = p.author_id WHERE TRUE",
        );
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ")
            .push_bind(params.limit())
            .push(" OFFSET ")
            .push_bind(params.offset());

        let items = query.build_query_as::<PostRow>().fetch_all(self.pool).await?;
        Ok(Page::new(items, params, total))
    }

    /// Get a post by ID, published or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: PostId) -> Result<Option<Post>, RepositoryError> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(post)
    }

    /// Create a post authored by `author_id`. A published post gets its
    /// `published_at` now.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create(
        &self,
        input: &ValidPost,
        author_id: UserId,
    ) -> Result<Post, RepositoryError> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "INSERT INTO posts (title, slug, excerpt, content, cover_image, is_published, \
                published_at, author_id) \
             VALUES ($1, $2, $3, $4, $5, $6, CASE WHEN $6 THEN now() END, $7) \
             RETURNING {POST_COLUMNS}"
        ))
        .bind(&input.title)
        .bind(&input.slug)
        .bind(input.excerpt.as_deref())
        .bind(&input.content)
        .bind(input.cover_image.as_deref())
        .bind(input.is_published)
        .bind(author_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "Slug"))?;

        tracing::info!(post_id = %post.id, slug = %post.slug, "Post created");
        Ok(post)
    }

    /// Overwrite a post. `published_at` is set the first time the post is
    /// published and kept afterwards, even across unpublishing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the post does not exist, or
    /// `RepositoryError::Conflict` if the slug is taken.
    pub async fn update(&self, id: PostId, input: &ValidPost) -> Result<Post, RepositoryError> {
        sqlx::query_as::<_, Post>(&format!(
            "UPDATE posts SET title = $2, slug = $3, excerpt = $4, content = $5, \
                cover_image = $6, is_published = $7, \
                published_at = CASE WHEN $7 THEN COALESCE(published_at, now()) \
                    ELSE published_at END, \
                updated_at = now() \
             WHERE id = $1 RETURNING {POST_COLUMNS}"
        ))
        .bind(id)
        .bind(&input.title)
        .bind(&input.slug)
        .bind(input.excerpt.as_deref())
        .bind(&input.content)
        .bind(input.cover_image.as_deref())
        .bind(input.is_published)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "Slug"))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a post.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the post does not exist.
    pub async fn delete(&self, id: PostId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        rows_affected_or_not_found(result.rows_affected())
    }
}

//! Blog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use kilala_core::{Page, PageParams, PostId};
use serde::Serialize;
use tracing::instrument;

use crate::db::PostRepository;
use crate::db::posts::PostSummary;
use crate::error::{AppError, Result};
use crate::services::content::{reading_time_minutes, render_markdown};
use crate::state::AppState;

/// Number of recent posts returned alongside a post.
const RECENT_POSTS_COUNT: i64 = 4;

/// A rendered blog post.
#[derive(Debug, Serialize)]
pub struct PostView {
    pub id: PostId,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub author_name: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub content_html: String,
    pub reading_time_minutes: u32,
    pub recent_posts: Vec<PostSummary>,
}

/// Published posts, newest first.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<PostSummary>>> {
    let page = PostRepository::new(state.pool())
        .list_published(&params)
        .await?;
    Ok(Json(page))
}

/// A published post with its markdown rendered to HTML.
///
/// # Errors
///
/// Returns 404 if the post doesn't exist or is a draft.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PostView>> {
    let posts = PostRepository::new(state.pool());

    let (post, author_name) = posts
        .get_published(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Không tìm thấy bài viết".to_string()))?;

    let recent_posts = posts
        .latest(RECENT_POSTS_COUNT + 1)
        .await?
        .into_iter()
        .filter(|p| p.id != post.id)
        .take(usize::try_from(RECENT_POSTS_COUNT).unwrap_or_default())
        .collect();

    Ok(Json(PostView {
        content_html: render_markdown(&post.content),
        reading_time_minutes: reading_time_minutes(&post.content),
        id: post.id,
        title: post.title,
        slug: post.slug,
        excerpt: post.excerpt,
        cover_image: post.cover_image,
        author_name,
        published_at: post.published_at,
        recent_posts,
    }))
}

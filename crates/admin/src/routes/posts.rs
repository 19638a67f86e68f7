//! Blog post CRUD.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use kilala_core::models::Post;
use kilala_core::{Page, PageParams, PostId};
use tracing::instrument;

use crate::db::PostRepository;
use crate::db::posts::{PostFilter, PostRow};
use crate::error::{AppError, Result, or_not_found};
use crate::middleware::RequireAdmin;
use crate::services::content::PostInput;
use crate::state::AppState;

const NOT_FOUND: &str = "Không tìm thấy bài viết";

/// Build the posts router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(index).post(create))
        .route("/posts/{id}", get(show).put(update).delete(destroy))
}

/// Drafts and published posts.
///
/// GET /posts
#[instrument(skip(state))]
async fn index(
    State(state): State<AppState>,
    Query(filter): Query<PostFilter>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<PostRow>>> {
    let page = PostRepository::new(state.pool())
        .list(&filter, &params)
        .await?;
    Ok(Json(page))
}

/// GET /posts/{id}
#[instrument(skip(state))]
async fn show(State(state): State<AppState>, Path(id): Path<PostId>) -> Result<Json<Post>> {
    PostRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))
}

/// The logged-in admin becomes the author.
///
/// POST /posts
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<PostInput>,
) -> Result<(StatusCode, Json<Post>)> {
    let input = input.validate()?;
    let post = PostRepository::new(state.pool())
        .create(&input, admin.id)
        .await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// PUT /posts/{id}
#[instrument(skip(state, input))]
async fn update(
    State(state): State<AppState>,
    Path(id): Path<PostId>,
    Json(input): Json<PostInput>,
) -> Result<Json<Post>> {
    let input = input.validate()?;
    let post = PostRepository::new(state.pool())
        .update(id, &input)
        .await
        .map_err(or_not_found(NOT_FOUND))?;
    Ok(Json(post))
}

/// DELETE /posts/{id}
#[instrument(skip(state))]
async fn destroy(State(state): State<AppState>, Path(id): Path<PostId>) -> Result<StatusCode> {
    PostRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(or_not_found(NOT_FOUND))?;
    tracing::info!(post_id = %id, "Post deleted");
    Ok(StatusCode::NO_CONTENT)
}

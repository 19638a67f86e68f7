//! Review moderation.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
};
use kilala_core::models::Review;
use kilala_core::{Page, PageParams, ReviewId};
use serde::Deserialize;
use tracing::instrument;

use crate::db::ReviewRepository;
use crate::db::reviews::{ReviewFilter, ReviewRow};
use crate::error::{Result, or_not_found};
use crate::state::AppState;

const NOT_FOUND: &str = "Không tìm thấy đánh giá";

/// `PATCH /reviews/{id}` payload.
#[derive(Debug, Deserialize)]
pub struct ModerateRequest {
    pub is_approved: bool,
}

/// Build the reviews router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reviews", get(index))
        .route("/reviews/{id}", patch(moderate).delete(destroy))
}

/// GET /reviews
#[instrument(skip(state))]
async fn index(
    State(state): State<AppState>,
    Query(filter): Query<ReviewFilter>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<ReviewRow>>> {
    let page = ReviewRepository::new(state.pool())
        .list(&filter, &params)
        .await?;
    Ok(Json(page))
}

/// Approve or hide a review.
///
/// PATCH /reviews/{id}
#[instrument(skip(state))]
async fn moderate(
    State(state): State<AppState>,
    Path(id): Path<ReviewId>,
    Json(req): Json<ModerateRequest>,
) -> Result<Json<Review>> {
    let review = ReviewRepository::new(state.pool())
        .set_approved(id, req.is_approved)
        .await
        .map_err(or_not_found(NOT_FOUND))?;
    Ok(Json(review))
}

/// DELETE /reviews/{id}
#[instrument(skip(state))]
async fn destroy(State(state): State<AppState>, Path(id): Path<ReviewId>) -> Result<StatusCode> {
    ReviewRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(or_not_found(NOT_FOUND))?;
    tracing::info!(review_id = %id, "Review deleted");
    Ok(StatusCode::NO_CONTENT)
}

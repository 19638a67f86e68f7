//! Categories, collections and tags.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use kilala_core::models::{Category, Collection, Tag};
use kilala_core::{CategoryId, CollectionId, TagId};
use tracing::instrument;

use crate::db::taxonomy::{CategoryRow, CollectionRow, TagRow};
use crate::db::{CategoryRepository, CollectionRepository, TagRepository};
use crate::error::{AppError, Result, or_not_found};
use crate::services::catalog::TaxonomyInput;
use crate::state::AppState;

const CATEGORY_NOT_FOUND: &str = "Không tìm thấy danh mục";
const COLLECTION_NOT_FOUND: &str = "Không tìm thấy bộ sưu tập";
const TAG_NOT_FOUND: &str = "Không tìm thấy thẻ";

/// Build the taxonomy router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/{id}",
            get(show_category)
                .put(update_category)
                .delete(delete_category),
        )
        .route("/collections", get(list_collections).post(create_collection))
        .route(
            "/collections/{id}",
            get(show_collection)
                .put(update_collection)
                .delete(delete_collection),
        )
        .route("/tags", get(list_tags).post(create_tag))
        .route(
            "/tags/{id}",
            get(show_tag).put(update_tag).delete(delete_tag),
        )
}

// Categories

#[instrument(skip(state))]
async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<CategoryRow>>> {
    Ok(Json(CategoryRepository::new(state.pool()).list().await?))
}

#[instrument(skip(state))]
async fn show_category(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<Category>> {
    CategoryRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(CATEGORY_NOT_FOUND.to_string()))
}

#[instrument(skip(state, input), fields(name = %input.name))]
async fn create_category(
    State(state): State<AppState>,
    Json(input): Json<TaxonomyInput>,
) -> Result<(StatusCode, Json<Category>)> {
    let input = input.validate()?;
    let category = CategoryRepository::new(state.pool()).create(&input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

#[instrument(skip(state, input))]
async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    Json(input): Json<TaxonomyInput>,
) -> Result<Json<Category>> {
    let input = input.validate()?;
    let category = CategoryRepository::new(state.pool())
        .update(id, &input)
        .await
        .map_err(or_not_found(CATEGORY_NOT_FOUND))?;
    Ok(Json(category))
}

/// Products of a deleted category are left without one.
#[instrument(skip(state))]
async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<StatusCode> {
    CategoryRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(or_not_found(CATEGORY_NOT_FOUND))?;
    tracing::info!(category_id = %id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}

// Collections

#[instrument(skip(state))]
async fn list_collections(State(state): State<AppState>) -> Result<Json<Vec<CollectionRow>>> {
    Ok(Json(CollectionRepository::new(state.pool()).list().await?))
}

#[instrument(skip(state))]
async fn show_collection(
    State(state): State<AppState>,
    Path(id): Path<CollectionId>,
) -> Result<Json<Collection>> {
    CollectionRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(COLLECTION_NOT_FOUND.to_string()))
}

#[instrument(skip(state, input), fields(name = %input.name))]
async fn create_collection(
    State(state): State<AppState>,
    Json(input): Json<TaxonomyInput>,
) -> Result<(StatusCode, Json<Collection>)> {
    let input = input.validate()?;
    let collection = CollectionRepository::new(state.pool())
        .create(&input)
        .await?;
    Ok((StatusCode::CREATED, Json(collection)))
}

#[instrument(skip(state, input))]
async fn update_collection(
    State(state): State<AppState>,
    Path(id): Path<CollectionId>,
    Json(input): Json<TaxonomyInput>,
) -> Result<Json<Collection>> {
    let input = input.validate()?;
    let collection = CollectionRepository::new(state.pool())
        .update(id, &input)
        .await
        .map_err(or_not_found(COLLECTION_NOT_FOUND))?;
    Ok(Json(collection))
}

#[instrument(skip(state))]
async fn delete_collection(
    State(state): State<AppState>,
    Path(id): Path<CollectionId>,
) -> Result<StatusCode> {
    CollectionRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(or_not_found(COLLECTION_NOT_FOUND))?;
    tracing::info!(collection_id = %id, "Collection deleted");
    Ok(StatusCode::NO_CONTENT)
}

// Tags

#[instrument(skip(state))]
async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<TagRow>>> {
    Ok(Json(TagRepository::new(state.pool()).list().await?))
}

#[instrument(skip(state))]
async fn show_tag(State(state): State<AppState>, Path(id): Path<TagId>) -> Result<Json<Tag>> {
    TagRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(TAG_NOT_FOUND.to_string()))
}

#[instrument(skip(state, input), fields(name = %input.name))]
async fn create_tag(
    State(state): State<AppState>,
    Json(input): Json<TaxonomyInput>,
) -> Result<(StatusCode, Json<Tag>)> {
    let input = input.validate()?;
    let tag = TagRepository::new(state.pool()).create(&input).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

#[instrument(skip(state, input))]
async fn update_tag(
    State(state): State<AppState>,
    Path(id): Path<TagId>,
    Json(input): Json<TaxonomyInput>,
) -> Result<Json<Tag>> {
    let input = input.validate()?;
    let tag = TagRepository::new(state.pool())
        .update(id, &input)
        .await
        .map_err(or_not_found(TAG_NOT_FOUND))?;
    Ok(Json(tag))
}

#[instrument(skip(state))]
async fn delete_tag(State(state): State<AppState>, Path(id): Path<TagId>) -> Result<StatusCode> {
    TagRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(or_not_found(TAG_NOT_FOUND))?;
    Ok(StatusCode::NO_CONTENT)
}

//! Product CRUD and product images.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
};
use kilala_core::models::ProductImage;
use kilala_core::{Page, PageParams, ProductId, ProductImageId};
use serde::Deserialize;
use tracing::instrument;

use super::uploads::{MAX_FILES_PER_REQUEST, body_limit, read_form};
use crate::db::products::{ProductDetail, ProductFilter, ProductRow};
use crate::db::{ImageRepository, ProductRepository};
use crate::error::{AppError, Result, or_not_found};
use crate::services::catalog::ProductInput;
use crate::state::AppState;

const NOT_FOUND: &str = "Không tìm thấy sản phẩm";

fn not_found() -> AppError {
    AppError::NotFound(NOT_FOUND.to_string())
}

/// `PATCH /products/{id}/images/order` payload.
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub image_ids: Vec<ProductImageId>,
}

/// Build the products router.
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    let images = Router::new()
        .route("/products/{id}/images", post(upload_images))
        .layer(DefaultBodyLimit::max(body_limit(
            max_upload_bytes,
            MAX_FILES_PER_REQUEST,
        )));

    Router::new()
        .route("/products", get(index).post(create))
        .route("/products/{id}", get(show).put(update).delete(destroy))
        .route("/products/{id}/images/order", patch(reorder_images))
        .route("/products/{id}/images/{image_id}", delete(delete_image))
        .merge(images)
}

/// Products with filters, inactive ones included.
///
/// GET /products
#[instrument(skip(state))]
async fn index(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<ProductRow>>> {
    let page = ProductRepository::new(state.pool())
        .list(&filter, &params)
        .await?;
    Ok(Json(page))
}

/// GET /products/{id}
#[instrument(skip(state))]
async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductDetail>> {
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(product))
}

/// POST /products
#[instrument(skip(state, input), fields(name = %input.name))]
async fn create(
    State(state): State<AppState>,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<ProductDetail>)> {
    let input = input.validate()?;
    let product = ProductRepository::new(state.pool()).create(&input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Overwrite a product with its attributes and tags.
///
/// PUT /products/{id}
#[instrument(skip(state, input))]
async fn update(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(input): Json<ProductInput>,
) -> Result<Json<ProductDetail>> {
    let input = input.validate()?;
    let product = ProductRepository::new(state.pool())
        .update(id, &input)
        .await
        .map_err(or_not_found(NOT_FOUND))?;
    Ok(Json(product))
}

/// Delete a product and its image files.
///
/// DELETE /products/{id}
#[instrument(skip(state))]
async fn destroy(State(state): State<AppState>, Path(id): Path<ProductId>) -> Result<StatusCode> {
    let urls = ProductRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(or_not_found(NOT_FOUND))?;

    for url in &urls {
        if let Err(e) = state.uploads().remove(url).await {
            tracing::warn!(error = %e, url = %url, "Failed to remove product image file");
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Append uploaded images after the product's current ones.
///
/// Every file is checked before any is written.
///
/// POST /products/{id}/images
#[instrument(skip(state, multipart))]
async fn upload_images(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<ProductImage>>)> {
    if !ProductRepository::new(state.pool()).exists(id).await? {
        return Err(not_found());
    }

    let form = read_form(multipart).await?;
    for bytes in &form.files {
        state.uploads().check(bytes)?;
    }

    let mut urls = Vec::with_capacity(form.files.len());
    for bytes in &form.files {
        match state.uploads().save(bytes).await {
            Ok(stored) => urls.push(stored.url),
            Err(e) => {
                discard(&state, &urls).await;
                return Err(e.into());
            }
        }
    }

    match ImageRepository::new(state.pool())
        .append(id, &urls, form.alt.as_deref())
        .await
    {
        Ok(images) => Ok((StatusCode::CREATED, Json(images))),
        Err(e) => {
            discard(&state, &urls).await;
            Err(or_not_found(NOT_FOUND)(e))
        }
    }
}

/// Remove files written for a request that failed.
async fn discard(state: &AppState, urls: &[String]) {
    for url in urls {
        if let Err(e) = state.uploads().remove(url).await {
            tracing::warn!(error = %e, url = %url, "Failed to remove orphaned upload");
        }
    }
}

/// PATCH /products/{id}/images/order
#[instrument(skip(state, req))]
async fn reorder_images(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(req): Json<ReorderRequest>,
) -> Result<Json<Vec<ProductImage>>> {
    let images = ImageRepository::new(state.pool())
        .reorder(id, &req.image_ids)
        .await?;
    Ok(Json(images))
}

/// Delete an image row and its file.
///
/// DELETE /products/{id}/images/{image_id}
#[instrument(skip(state))]
async fn delete_image(
    State(state): State<AppState>,
    Path((id, image_id)): Path<(ProductId, ProductImageId)>,
) -> Result<StatusCode> {
    let url = ImageRepository::new(state.pool())
        .delete(id, image_id)
        .await
        .map_err(or_not_found("Không tìm thấy ảnh"))?;

    if let Err(e) = state.uploads().remove(&url).await {
        tracing::warn!(error = %e, url = %url, "Failed to remove product image file");
    }
    Ok(StatusCode::NO_CONTENT)
}

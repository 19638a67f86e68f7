//! Product listing, product pages and reviews.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use kilala_core::models::{Product, Review};
use kilala_core::{Page, PageParams, Price};
use tracing::instrument;

use crate::db::reviews::ReviewView;
use crate::db::{CatalogRepository, ProductRepository, ReviewRepository};
use crate::error::{AppError, Result};
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::{ProductCard, ProductDetail, ProductFilter, RatingSummary};
use crate::services::reviews::{self, Eligibility, ReviewInput};
use crate::state::AppState;

/// Related products shown on a product page.
const RELATED_LIMIT: i64 = 4;

async fn active_product(state: &AppState, slug: &str) -> Result<Product> {
    ProductRepository::new(state.pool())
        .get_active_by_slug(slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Không tìm thấy sản phẩm".to_string()))
}

/// Filtered, sorted and paginated product listing.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<ProductCard>>> {
    let page = ProductRepository::new(state.pool())
        .list(&filter, &params)
        .await?;
    Ok(Json(page))
}

/// Product page with images, attributes, tags, rating and related products.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProductDetail>> {
    let product = active_product(&state, &slug).await?;
    let products = ProductRepository::new(state.pool());
    let catalog = CatalogRepository::new(state.pool());

    let (images, attributes, tags, counts, related, category, collection) = tokio::try_join!(
        products.images(product.id),
        products.attributes(product.id),
        products.tags(product.id),
        products.rating_counts(product.id),
        products.related(product.id, product.category_id, RELATED_LIMIT),
        async {
            match product.category_id {
                Some(id) => catalog.category_by_id(id).await,
                None => Ok(None),
            }
        },
        async {
            match product.collection_id {
                Some(id) => catalog.collection_by_id(id).await,
                None => Ok(None),
            }
        },
    )?;

    let effective_price = product.effective_price();

    Ok(Json(ProductDetail {
        effective_price,
        display_price: Price::new(effective_price).format_vnd(),
        in_stock: product.in_stock(),
        product,
        images,
        attributes,
        tags,
        category,
        collection,
        rating: RatingSummary::from_counts(&counts),
        related,
    }))
}

/// Approved reviews of a product, newest first.
#[instrument(skip(state))]
pub async fn reviews(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<ReviewView>>> {
    let product = active_product(&state, &slug).await?;
    let page = ReviewRepository::new(state.pool())
        .list_approved(product.id, &params)
        .await?;
    Ok(Json(page))
}

/// Whether the current visitor may review the product.
#[instrument(skip(state, user))]
pub async fn review_eligibility(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(slug): Path<String>,
) -> Result<Json<Eligibility>> {
    let product = active_product(&state, &slug).await?;
    let eligibility =
        reviews::eligibility(state.pool(), user.map(|u| u.id), product.id).await?;
    Ok(Json(eligibility))
}

/// Post a review for a delivered product.
#[instrument(skip(state, user, input), fields(user_id = %user.id))]
pub async fn create_review(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(slug): Path<String>,
    Json(input): Json<ReviewInput>,
) -> Result<(StatusCode, Json<Review>)> {
    let product = active_product(&state, &slug).await?;

    let eligibility = reviews::eligibility(state.pool(), Some(user.id), product.id).await?;
    if let Some(reason) = eligibility.reason {
        return Err(AppError::Forbidden(reason.message().to_string()));
    }

    let review = input
        .validate()
        .map_err(|msg| AppError::BadRequest(msg.to_string()))?;

    let review = ReviewRepository::new(state.pool())
        .create(user.id, product.id, review.rating, review.comment.as_deref())
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::Conflict(_) => {
                AppError::Conflict(reviews::IneligibleReason::AlreadyReviewed.message().to_string())
            }
            other => AppError::Database(other),
        })?;

    tracing::info!(product_id = %product.id, rating = review.rating, "Review created");

    Ok((StatusCode::CREATED, Json(review)))
}

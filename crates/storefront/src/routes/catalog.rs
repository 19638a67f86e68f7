//! Home page, navigation lists and category/collection pages.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use kilala_core::models::{Category, Collection};
use kilala_core::{Page, PageParams};
use serde::Serialize;
use tracing::instrument;

use crate::cache::CacheKey;
use crate::db::posts::PostSummary;
use crate::db::{CatalogRepository, PostRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::models::{NavItem, ProductCard, ProductFilter};
use crate::state::AppState;

/// Products shown in each home page strip.
const HOME_STRIP_SIZE: i64 = 8;

/// Posts shown on the home page.
const HOME_POSTS: i64 = 3;

/// Home page payload.
#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub featured: Vec<ProductCard>,
    pub newest: Vec<ProductCard>,
    pub collections: Arc<Vec<NavItem>>,
    pub posts: Vec<PostSummary>,
}

/// A category with its first page of products.
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub category: Category,
    pub products: Page<ProductCard>,
}

/// A collection with its first page of products.
#[derive(Debug, Serialize)]
pub struct CollectionResponse {
    pub collection: Collection,
    pub products: Page<ProductCard>,
}

/// Cached category navigation.
pub(crate) async fn category_nav(state: &AppState) -> Result<Arc<Vec<NavItem>>> {
    let pool = state.pool();
    Ok(state
        .nav_cache()
        .get_or_load(CacheKey::Categories, || async {
            CatalogRepository::new(pool).category_nav().await
        })
        .await?)
}

/// Cached collection navigation.
pub(crate) async fn collection_nav(state: &AppState) -> Result<Arc<Vec<NavItem>>> {
    let pool = state.pool();
    Ok(state
        .nav_cache()
        .get_or_load(CacheKey::Collections, || async {
            CatalogRepository::new(pool).collection_nav().await
        })
        .await?)
}

/// Cached tag navigation.
pub(crate) async fn tag_nav(state: &AppState) -> Result<Arc<Vec<NavItem>>> {
    let pool = state.pool();
    Ok(state
        .nav_cache()
        .get_or_load(CacheKey::Tags, || async {
            CatalogRepository::new(pool).tag_nav().await
        })
        .await?)
}

/// Home page: featured and newest products, collections and latest posts.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Result<Json<HomeResponse>> {
    let products = ProductRepository::new(state.pool());
    let posts = PostRepository::new(state.pool());

    let (featured, newest, collections, posts) = tokio::try_join!(
        async { Ok::<_, AppError>(products.featured(HOME_STRIP_SIZE).await?) },
        async { Ok::<_, AppError>(products.newest(HOME_STRIP_SIZE).await?) },
        collection_nav(&state),
        async { Ok::<_, AppError>(posts.latest(HOME_POSTS).await?) },
    )?;

    Ok(Json(HomeResponse {
        featured,
        newest,
        collections,
        posts,
    }))
}

/// All categories with product counts.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Arc<Vec<NavItem>>>> {
    Ok(Json(category_nav(&state).await?))
}

/// All collections with product counts.
#[instrument(skip(state))]
pub async fn collections(State(state): State<AppState>) -> Result<Json<Arc<Vec<NavItem>>>> {
    Ok(Json(collection_nav(&state).await?))
}

/// All tags with product counts.
#[instrument(skip(state))]
pub async fn tags(State(state): State<AppState>) -> Result<Json<Arc<Vec<NavItem>>>> {
    Ok(Json(tag_nav(&state).await?))
}

/// A category and its products, filtered like `/api/products`.
#[instrument(skip(state, filter, params))]
pub async fn category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(mut filter): Query<ProductFilter>,
    Query(params): Query<PageParams>,
) -> Result<Json<CategoryResponse>> {
    let category = CatalogRepository::new(state.pool())
        .category_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Không tìm thấy danh mục".to_string()))?;

    filter.category = Some(category.slug.clone());
    let products = ProductRepository::new(state.pool())
        .list(&filter, &params)
        .await?;

    Ok(Json(CategoryResponse { category, products }))
}

/// A collection and its products, filtered like `/api/products`.
#[instrument(skip(state, filter, params))]
pub async fn collection(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(mut filter): Query<ProductFilter>,
    Query(params): Query<PageParams>,
) -> Result<Json<CollectionResponse>> {
    let collection = CatalogRepository::new(state.pool())
        .collection_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Không tìm thấy bộ sưu tập".to_string()))?;

    filter.collection = Some(collection.slug.clone());
    let products = ProductRepository::new(state.pool())
        .list(&filter, &params)
        .await?;

    Ok(Json(CollectionResponse {
        collection,
        products,
    }))
}

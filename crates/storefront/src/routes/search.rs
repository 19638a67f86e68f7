//! Quick product search for the header search box.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use crate::db::ProductRepository;
use crate::error::Result;
use crate::models::ProductCard;
use crate::state::AppState;

/// Most results returned by quick search.
const SEARCH_LIMIT: i64 = 8;

/// Shortest query that triggers a search.
const MIN_QUERY_CHARS: usize = 2;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Search active products by name, brand and SKU.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<ProductCard>>> {
    let q = query.q.trim();
    if q.chars().count() < MIN_QUERY_CHARS {
        return Ok(Json(Vec::new()));
    }

    let results = ProductRepository::new(state.pool())
        .search(q, SEARCH_LIMIT)
        .await?;

    tracing::debug!(query = q, count = results.len(), "Search completed");

    Ok(Json(results))
}

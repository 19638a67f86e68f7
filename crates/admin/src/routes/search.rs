//! Quick search across products, orders, users, posts and categories.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

use crate::db::SearchRepository;
use crate::db::search::SearchResults;
use crate::error::Result;
use crate::state::AppState;

/// Search query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Build the search router.
pub fn router() -> Router<AppState> {
    Router::new().route("/search", get(search))
}

/// GET /search?q=
#[instrument(skip(state))]
async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResults>> {
    let results = SearchRepository::new(state.pool()).search(&query.q).await?;
    Ok(Json(results))
}

//! Dashboard overview.

use axum::{Json, Router, extract::State, routing::get};
use tracing::instrument;

use crate::db::DashboardRepository;
use crate::db::dashboard::Dashboard;
use crate::error::Result;
use crate::state::AppState;

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new().route("/dashboard", get(show))
}

/// Totals, revenue, order breakdown, low stock and best sellers.
///
/// GET /dashboard
#[instrument(skip(state))]
async fn show(State(state): State<AppState>) -> Result<Json<Dashboard>> {
    let dashboard = DashboardRepository::new(state.pool())
        .load(state.config().low_stock_threshold)
        .await?;
    Ok(Json(dashboard))
}

//! Order listing, detail and status changes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};
use kilala_core::{OrderId, OrderStatus, Page, PageParams};
use serde::Deserialize;
use tracing::instrument;

use crate::db::OrderRepository;
use crate::db::orders::{OrderDetail, OrderFilter, OrderSummary};
use crate::error::{AppError, Result, or_not_found};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

const NOT_FOUND: &str = "Không tìm thấy đơn hàng";

/// `PATCH /orders/{id}/status` payload.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: OrderStatus,
}

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(index))
        .route("/orders/{id}", get(show))
        .route("/orders/{id}/status", patch(update_status))
}

/// GET /orders
#[instrument(skip(state))]
async fn index(
    State(state): State<AppState>,
    Query(filter): Query<OrderFilter>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<OrderSummary>>> {
    let page = OrderRepository::new(state.pool())
        .list(&filter, &params)
        .await?;
    Ok(Json(page))
}

/// GET /orders/{id}
#[instrument(skip(state))]
async fn show(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>> {
    OrderRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))
}

/// Move an order along its lifecycle.
///
/// PATCH /orders/{id}/status
#[instrument(skip(state, admin, req), fields(admin_id = %admin.id, status = %req.status))]
async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<OrderDetail>> {
    let order = OrderRepository::new(state.pool())
        .update_status(id, req.status)
        .await
        .map_err(or_not_found(NOT_FOUND))?;
    Ok(Json(order))
}

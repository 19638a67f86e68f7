//! Checkout and guest order lookup.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use kilala_core::{Email, OrderCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::db::OrderRepository;
use crate::db::orders::OrderDetail;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::OptionalAuth;
use crate::models::session_keys;
use crate::routes::cart::load_cart;
use crate::services::cart::Cart;
use crate::services::checkout::CheckoutForm;
use crate::state::AppState;

/// Guest lookup query.
#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    #[serde(default)]
    pub email: String,
}

/// Place an order for the session cart.
///
/// Stock is checked and decremented inside the order transaction; a line
/// that can no longer be fulfilled aborts the whole order with 409.
#[instrument(skip(state, session, user, form))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Json(form): Json<CheckoutForm>,
) -> Result<(StatusCode, Json<OrderDetail>)> {
    let checkout = form
        .validate()
        .map_err(|errors| AppError::BadRequest(errors.message()))?;

    let cart = load_cart(&session).await?;
    if cart.is_empty() {
        return Err(AppError::BadRequest("Giỏ hàng của bạn đang trống".to_string()));
    }

    add_breadcrumb("checkout", "Placing order", None);

    let order = OrderRepository::new(state.pool())
        .place(
            &checkout,
            user.map(|u| u.id),
            &cart.lines,
            state.shipping(),
        )
        .await?;

    session.remove::<Cart>(session_keys::CART).await?;

    Ok((StatusCode::CREATED, Json(order)))
}

/// Look up an order by its code and the email used at checkout.
#[instrument(skip(state, query))]
pub async fn lookup(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<LookupQuery>,
) -> Result<Json<OrderDetail>> {
    let not_found = || AppError::NotFound("Không tìm thấy đơn hàng".to_string());

    let code = OrderCode::parse(&code).ok_or_else(not_found)?;
    let email = Email::parse(&query.email)
        .map_err(|_| AppError::BadRequest("Email không hợp lệ".to_string()))?;

    let order = OrderRepository::new(state.pool())
        .find_by_code_and_email(&code, &email)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(order))
}

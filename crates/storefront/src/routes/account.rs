//! Customer account: profile, password and order history.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use kilala_core::models::{Order, User};
use kilala_core::{OrderId, Page, PageParams};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::db::OrderRepository;
use crate::db::orders::OrderDetail;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAuth, set_current_user};
use crate::models::CurrentUser;
use crate::services::auth::{AuthService, ProfileUpdate};
use crate::state::AppState;

/// Password change request.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: SecretString,
    pub new_password: SecretString,
}

/// Update name, phone or address.
#[instrument(skip(state, session, user, update), fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<User>> {
    let updated = AuthService::new(state.pool())
        .update_profile(user.id, update)
        .await?;

    if updated.name != user.name {
        let current = CurrentUser {
            name: updated.name.clone(),
            ..user
        };
        set_current_user(&session, &current).await?;
    }

    Ok(Json(updated))
}

/// Change password after confirming the current one.
#[instrument(skip(state, user, req), fields(user_id = %user.id))]
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<StatusCode> {
    AuthService::new(state.pool())
        .change_password(
            user.id,
            req.current_password.expose_secret(),
            req.new_password.expose_secret(),
        )
        .await
        .map_err(|e| match e {
            crate::services::auth::AuthError::InvalidCredentials => {
                AppError::BadRequest("Mật khẩu hiện tại không đúng".to_string())
            }
            other => other.into(),
        })?;

    tracing::info!("Password changed");
    Ok(StatusCode::NO_CONTENT)
}

/// The customer's orders, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<Order>>> {
    let page = OrderRepository::new(state.pool())
        .list_for_user(user.id, &params)
        .await?;
    Ok(Json(page))
}

/// One of the customer's orders.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>> {
    let order = OrderRepository::new(state.pool())
        .get_for_user(id, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Không tìm thấy đơn hàng".to_string()))?;
    Ok(Json(order))
}

/// Cancel a pending order and restore its stock.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn cancel_order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>> {
    let order = OrderRepository::new(state.pool())
        .cancel_for_user(id, user.id)
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::NotFound => {
                AppError::NotFound("Không tìm thấy đơn hàng".to_string())
            }
            other => other.into(),
        })?;
    Ok(Json(order))
}

//! Customer and admin accounts.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use kilala_core::models::{Order, User};
use kilala_core::{Page, PageParams, UserId};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::db::users::{UserFilter, UserSummary};
use crate::db::{OrderRepository, UserRepository};
use crate::error::{AppError, Result, or_not_found};
use crate::middleware::{RequireAdmin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::services::users::{UserUpdateInput, check_self_delete, check_self_update};
use crate::state::AppState;

const NOT_FOUND: &str = "Không tìm thấy người dùng";

/// Orders shown on a user's page.
const RECENT_ORDERS: i64 = 10;

/// A user with their latest orders.
#[derive(Debug, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    pub recent_orders: Vec<Order>,
}

/// Build the users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(index))
        .route("/users/{id}", get(show).patch(update).delete(destroy))
}

/// GET /users
#[instrument(skip(state))]
async fn index(
    State(state): State<AppState>,
    Query(filter): Query<UserFilter>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<UserSummary>>> {
    let page = UserRepository::new(state.pool())
        .list(&filter, &params)
        .await?;
    Ok(Json(page))
}

/// GET /users/{id}
#[instrument(skip(state))]
async fn show(State(state): State<AppState>, Path(id): Path<UserId>) -> Result<Json<UserDetail>> {
    let user = UserRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;
    let recent_orders = OrderRepository::new(state.pool())
        .recent_for_user(id, RECENT_ORDERS)
        .await?;

    Ok(Json(UserDetail {
        user,
        recent_orders,
    }))
}

/// Edit profile fields or the role. An admin cannot demote themselves.
///
/// PATCH /users/{id}
#[instrument(skip(state, session, admin, input), fields(admin_id = %admin.id))]
async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
    Json(input): Json<UserUpdateInput>,
) -> Result<Json<User>> {
    let changes = input.validate()?;
    check_self_update(admin.id, id, &changes)
        .map_err(|msg| AppError::Forbidden(msg.to_string()))?;

    let user = UserRepository::new(state.pool())
        .update(id, &changes)
        .await
        .map_err(or_not_found(NOT_FOUND))?;

    if let Some(role) = changes.role {
        tracing::info!(user_id = %id, role = ?role, "User role set");
    }

    if user.id == admin.id && user.name != admin.name {
        let current = CurrentAdmin {
            name: user.name.clone(),
            ..admin
        };
        set_current_admin(&session, &current).await?;
    }

    Ok(Json(user))
}

/// Delete an account. Orders keep their customer snapshot.
///
/// DELETE /users/{id}
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
async fn destroy(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<StatusCode> {
    check_self_delete(admin.id, id).map_err(|msg| AppError::Forbidden(msg.to_string()))?;

    UserRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(or_not_found(NOT_FOUND))?;

    tracing::info!(user_id = %id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

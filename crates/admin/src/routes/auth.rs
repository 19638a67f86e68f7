//! Admin login, logout and identity.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAdmin, clear_current_admin, login_rate_limiter, set_current_admin};
use crate::models::CurrentAdmin;
use crate::services::auth::{AdminAuthError, AdminAuthService};
use crate::state::AppState;

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: SecretString,
}

/// Routes reachable without a session.
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .layer(login_rate_limiter())
}

/// Routes for the logged-in admin.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

/// Log in with email and password. Only accounts with role `admin` pass.
///
/// POST /auth/login
#[instrument(skip(state, session, req), fields(email = %req.email))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> Result<Json<CurrentAdmin>> {
    let user = AdminAuthService::new(state.pool())
        .login(&req.email, req.password.expose_secret())
        .await
        .inspect_err(|e| match e {
            AdminAuthError::InvalidCredentials => tracing::warn!("Failed admin login attempt"),
            AdminAuthError::NotAdmin => tracing::warn!("Customer account tried admin login"),
            AdminAuthError::Repository(_) => {}
        })?;

    let admin = CurrentAdmin {
        id: user.id,
        email: user.email,
        name: user.name,
    };
    set_current_admin(&session, &admin).await?;
    set_sentry_user(&admin.id, Some(admin.email.as_str()));

    tracing::info!(user_id = %admin.id, "Admin logged in");
    Ok(Json(admin))
}

/// End the session.
///
/// POST /auth/logout
#[instrument(skip(session, admin), fields(user_id = %admin.id))]
async fn logout(session: Session, RequireAdmin(admin): RequireAdmin) -> Result<StatusCode> {
    clear_current_admin(&session).await?;
    clear_sentry_user();
    tracing::info!("Admin logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// The logged-in admin.
///
/// GET /auth/me
async fn me(RequireAdmin(admin): RequireAdmin) -> Json<CurrentAdmin> {
    Json(admin)
}

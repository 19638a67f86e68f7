//! Customer registration, login and logout.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use kilala_core::models::User;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Registration request.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: SecretString,
    pub name: String,
    pub phone: Option<String>,
}

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: SecretString,
}

async fn start_session(session: &Session, user: &User) -> Result<()> {
    let current = CurrentUser {
        id: user.id,
        email: user.email.clone(),
        name: user.name.clone(),
    };
    set_current_user(session, &current).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

/// Create an account and log it in.
#[instrument(skip(state, session, req), fields(email = %req.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let user = AuthService::new(state.pool())
        .register(
            &req.email,
            req.password.expose_secret(),
            &req.name,
            req.phone.as_deref(),
        )
        .await?;

    start_session(&session, &user).await?;
    tracing::info!(user_id = %user.id, "Customer registered");

    Ok((StatusCode::CREATED, Json(user)))
}

/// Log in with email and password.
#[instrument(skip(state, session, req), fields(email = %req.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> Result<Json<User>> {
    let user = AuthService::new(state.pool())
        .login(&req.email, req.password.expose_secret())
        .await
        .inspect_err(|e| {
            if matches!(e, AuthError::InvalidCredentials) {
                tracing::warn!("Failed login attempt");
            }
        })?;

    start_session(&session, &user).await?;
    tracing::info!(user_id = %user.id, "Customer logged in");

    Ok(Json(user))
}

/// Log out. The cart stays in the session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The logged-in customer's account.
#[instrument(skip(state, session, user))]
pub async fn me(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<Json<User>> {
    match AuthService::new(state.pool()).get_user(user.id).await {
        Ok(user) => Ok(Json(user)),
        Err(AuthError::UserNotFound) => {
            // Account was deleted while the session was alive.
            clear_current_user(&session).await?;
            Err(AppError::Unauthorized("Vui lòng đăng nhập".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

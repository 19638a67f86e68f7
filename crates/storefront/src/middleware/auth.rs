//! Authentication extractors.
//!
//! Customers log in with email and password; the logged-in user is kept in
//! the session under [`session_keys::CURRENT_USER`].

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::db::UserRepository;
use crate::error::AppError;
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// Extractor that requires a logged-in customer.
///
/// The session user is checked against `users` on every request; a session
/// whose account was deleted is logged out and rejected with 401.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Xin chào, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        current_user(parts, state)
            .await?
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("Vui lòng đăng nhập".to_string()))
    }
}

/// Extractor that optionally gets the current customer.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is logged
/// in. A session whose account was deleted counts as a guest.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        current_user(parts, state).await.map(Self)
    }
}

/// The session user, if their account still exists.
async fn current_user(parts: &Parts, state: &AppState) -> Result<Option<CurrentUser>, AppError> {
    // Set by SessionManagerLayer
    let Some(session) = parts.extensions.get::<Session>() else {
        return Ok(None);
    };

    let Some(user) = session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
    else {
        return Ok(None);
    };

    if UserRepository::new(state.pool()).exists(user.id).await? {
        return Ok(Some(user));
    }

    tracing::info!(user_id = %user.id, "Session user no longer exists, logging out");
    clear_current_user(session).await?;
    Ok(None)
}

/// Store the logged-in customer in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Remove the logged-in customer from the session (logout).
///
/// The cart is kept so a customer who logs out can still check out as a guest.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    session.cycle_id().await
}

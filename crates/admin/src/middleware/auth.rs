//! Admin authentication guard and extractor.
//!
//! [`require_admin`] wraps every protected route. It loads the admin from the
//! session and re-reads their role from the database, so revoking the role
//! or deleting the account takes effect on the next request.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use kilala_core::UserRole;
use tower_sessions::Session;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::models::{CurrentAdmin, session_keys};
use crate::services::auth::AdminAuthService;
use crate::state::AppState;

const LOGIN_REQUIRED: &str = "Vui lòng đăng nhập";

/// Middleware that rejects requests without an admin session.
///
/// - no session or no admin in it: 401
/// - account deleted: session flushed, 401
/// - role no longer `admin`: 403
///
/// On success the [`CurrentAdmin`] is added to the request extensions.
///
/// # Errors
///
/// Returns `AppError::Unauthorized`, `AppError::Forbidden`, or a database
/// error if the role lookup fails.
pub async fn require_admin(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let admin: CurrentAdmin = session
        .get(session_keys::CURRENT_ADMIN)
        .await?
        .ok_or_else(|| AppError::Unauthorized(LOGIN_REQUIRED.to_string()))?;

    let role = AdminAuthService::new(state.pool())
        .current_role(admin.id)
        .await?;

    match role {
        Some(UserRole::Admin) => {}
        Some(UserRole::Customer) => {
            tracing::warn!(user_id = %admin.id, "Admin role revoked, rejecting session");
            return Err(AppError::Forbidden(
                "Tài khoản không còn quyền quản trị".to_string(),
            ));
        }
        None => {
            tracing::warn!(user_id = %admin.id, "Admin account deleted, ending session");
            session.flush().await?;
            clear_sentry_user();
            return Err(AppError::Unauthorized(LOGIN_REQUIRED.to_string()));
        }
    }

    set_sentry_user(&admin.id, Some(admin.email.as_str()));
    request.extensions_mut().insert(admin);

    Ok(next.run(request).await)
}

/// Extractor for the admin verified by [`require_admin`].
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireAdmin(admin): RequireAdmin) -> String {
///     format!("Xin chào, {}!", admin.name)
/// }
/// ```
pub struct RequireAdmin(pub CurrentAdmin);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentAdmin>()
            .cloned()
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized(LOGIN_REQUIRED.to_string()))
    }
}

/// Store the logged-in admin in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// End the admin session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be deleted.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

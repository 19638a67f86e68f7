//! Unified error handling for the admin API.
//!
//! Every error is rendered as `{"error": "<message>"}`. Server-side failures
//! are captured to Sentry and their details are never sent to the client.

use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AdminAuthError;
use crate::services::catalog::ValidationErrors;
use crate::services::uploads::UploadError;

/// Generic message for server-side failures.
pub const INTERNAL_MESSAGE: &str = "Đã có lỗi xảy ra, vui lòng thử lại";

/// Application-level error type for the admin API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AdminAuthError),

    /// Session store failure.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Upload rejected or could not be stored.
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// Payload failed validation.
    #[error("Validation failed: {}", .0.message())]
    Validation(ValidationErrors),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request conflicts with current state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Request body exceeds the limit.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge("Tệp vượt quá dung lượng cho phép".to_string())
        } else {
            Self::BadRequest(format!("Dữ liệu tải lên không hợp lệ: {}", err.body_text()))
        }
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Auth(err) => match err {
                AdminAuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AdminAuthError::NotAdmin => StatusCode::FORBIDDEN,
                AdminAuthError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Upload(err) => match err {
                UploadError::Empty | UploadError::UnsupportedType => StatusCode::BAD_REQUEST,
                UploadError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                UploadError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    /// Message shown to the client. Internal details are never exposed.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => "Không tìm thấy dữ liệu".to_string(),
                RepositoryError::Conflict(msg) => msg.clone(),
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    INTERNAL_MESSAGE.to_string()
                }
            },
            Self::Auth(err) => match err {
                AdminAuthError::InvalidCredentials => "Email hoặc mật khẩu không đúng".to_string(),
                AdminAuthError::NotAdmin => "Tài khoản không có quyền quản trị".to_string(),
                AdminAuthError::Repository(_) => INTERNAL_MESSAGE.to_string(),
            },
            Self::Upload(err) => err.message(),
            Self::Validation(errors) => errors.message(),
            Self::Session(_) | Self::Internal(_) => INTERNAL_MESSAGE.to_string(),
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg)
            | Self::Conflict(msg)
            | Self::PayloadTooLarge(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        (status, Json(json!({ "error": self.client_message() }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Turn `RepositoryError::NotFound` into a 404 naming what was missing.
///
/// ```rust,ignore
/// repo.delete(id).await.map_err(or_not_found("Không tìm thấy sản phẩm"))?;
/// ```
pub fn or_not_found(message: &'static str) -> impl FnOnce(RepositoryError) -> AppError {
    move |err| match err {
        RepositoryError::NotFound => AppError::NotFound(message.to_string()),
        other => AppError::Database(other),
    }
}

/// Set the Sentry user context from an admin's user ID.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order-123".to_string());
        assert_eq!(err.to_string(), "Not found: order-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            let response = err.into_response();
            response.status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::PayloadTooLarge("test".to_string())),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_errors_are_bad_requests() {
        let err = AppError::from(ValidationErrors(vec![
            ("name", "Vui lòng nhập tên sản phẩm"),
            ("price", "Giá phải lớn hơn 0"),
        ]));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.client_message(),
            "Vui lòng nhập tên sản phẩm; Giá phải lớn hơn 0"
        );
    }

    #[test]
    fn test_upload_errors_map_by_kind() {
        assert_eq!(
            AppError::from(UploadError::TooLarge { limit: 1024 }).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            AppError::from(UploadError::UnsupportedType).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_auth_errors_map_by_kind() {
        assert_eq!(
            AppError::from(AdminAuthError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(AdminAuthError::NotAdmin).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_or_not_found_names_the_entity() {
        let err = or_not_found("Không tìm thấy bài viết")(RepositoryError::NotFound);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.client_message(), "Không tìm thấy bài viết");

        let err = or_not_found("Không tìm thấy bài viết")(RepositoryError::Conflict(
            "Slug đã tồn tại".to_string(),
        ));
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::Database(RepositoryError::DataCorruption("bad enum".to_string()));
        assert_eq!(err.client_message(), INTERNAL_MESSAGE);

        let err = AppError::from(UploadError::Io(std::io::Error::other("disk full")));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.client_message().contains("disk full"));
    }
}

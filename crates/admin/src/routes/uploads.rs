//! Standalone image uploads and the multipart plumbing shared with product
//! images.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
};
use serde::Serialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::services::uploads::UploadError;
use crate::state::AppState;

/// Most files accepted in one request.
pub const MAX_FILES_PER_REQUEST: usize = 10;

/// Room for multipart boundaries and text fields on top of the file bytes.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Request body limit for a form carrying up to `files` images.
#[must_use]
pub const fn body_limit(max_upload_bytes: usize, files: usize) -> usize {
    max_upload_bytes
        .saturating_mul(files)
        .saturating_add(MULTIPART_OVERHEAD)
}

/// Parts of an upload form.
#[derive(Debug, Default)]
pub struct UploadForm {
    /// Contents of every `file` part, in order.
    pub files: Vec<Bytes>,
    /// Optional `alt` text field.
    pub alt: Option<String>,
}

/// Read `file` and `alt` parts; anything else is skipped.
///
/// # Errors
///
/// Returns `BadRequest` for a malformed body or too many files,
/// `PayloadTooLarge` when the body limit is hit, and `Upload(Empty)` when no
/// file was sent.
pub async fn read_form(mut multipart: Multipart) -> Result<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                if form.files.len() == MAX_FILES_PER_REQUEST {
                    return Err(AppError::BadRequest(format!(
                        "Tối đa {MAX_FILES_PER_REQUEST} tệp mỗi lần tải lên"
                    )));
                }
                form.files.push(field.bytes().await?);
            }
            Some("alt") => {
                let alt = field.text().await?;
                let alt = alt.trim();
                if !alt.is_empty() {
                    form.alt = Some(alt.to_string());
                }
            }
            _ => {}
        }
    }

    if form.files.is_empty() {
        return Err(UploadError::Empty.into());
    }
    Ok(form)
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    url: String,
}

/// Build the uploads router.
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/uploads", post(upload))
        .layer(DefaultBodyLimit::max(body_limit(max_upload_bytes, 1)))
}

/// Store one image for a category, collection or post cover.
///
/// POST /uploads
#[instrument(skip(state, multipart))]
async fn upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>)> {
    let mut files = read_form(multipart).await?.files.into_iter();
    let (Some(bytes), None) = (files.next(), files.next()) else {
        return Err(AppError::BadRequest("Chỉ được tải lên một tệp".to_string()));
    };

    let stored = state.uploads().save(&bytes).await?;
    Ok((StatusCode::CREATED, Json(UploadResponse { url: stored.url })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_limit_scales_with_files() {
        assert_eq!(body_limit(1024, 1), 1024 + MULTIPART_OVERHEAD);
        assert_eq!(body_limit(1024, 3), 3 * 1024 + MULTIPART_OVERHEAD);
        assert_eq!(body_limit(usize::MAX, 2), usize::MAX);
    }
}

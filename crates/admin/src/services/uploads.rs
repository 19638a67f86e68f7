//! Image uploads written to `UPLOAD_DIR` and served by the storefront.
//!
//! The type is detected from the file's leading bytes; the client's
//! filename and content type are ignored. Files are stored as
//! `<uuid>.<ext>` and referenced as `/uploads/<uuid>.<ext>`.

use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

/// URL prefix under which the storefront serves `UPLOAD_DIR`.
pub const URL_PREFIX: &str = "/uploads/";

/// Accepted image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Webp,
    Gif,
}

impl ImageKind {
    /// Detect the format from magic bytes.
    #[must_use]
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [0xFF, 0xD8, 0xFF, ..] => Some(Self::Jpeg),
            [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some(Self::Png),
            [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => Some(Self::Gif),
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some(Self::Webp),
            _ => None,
        }
    }

    /// File extension without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Gif => "gif",
        }
    }
}

/// Upload failures.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The file part had no content.
    #[error("empty file")]
    Empty,

    /// The file exceeds the configured limit.
    #[error("file exceeds {limit} bytes")]
    TooLarge { limit: usize },

    /// Not a JPEG, PNG, WebP or GIF.
    #[error("unsupported file type")]
    UnsupportedType,

    /// Writing or deleting the file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    /// Vietnamese message for the client.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Empty => "Tệp tải lên trống".to_string(),
            Self::TooLarge { limit } => {
                format!("Tệp vượt quá dung lượng cho phép ({} MB)", limit / (1024 * 1024))
            }
            Self::UnsupportedType => "Chỉ chấp nhận ảnh JPEG, PNG, WebP hoặc GIF".to_string(),
            Self::Io(_) => "Không thể lưu tệp".to_string(),
        }
    }
}

/// A file that was written to the upload directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    /// Public URL, e.g. `/uploads/4f0c….webp`.
    pub url: String,
    pub kind: ImageKind,
}

/// Extract the stored file name from an upload URL.
///
/// Returns `None` for URLs outside [`URL_PREFIX`] and for anything that
/// could escape the upload directory.
#[must_use]
pub fn file_name_from_url(url: &str) -> Option<&str> {
    let name = url.strip_prefix(URL_PREFIX)?;
    let safe = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    safe.then_some(name)
}

/// Writes and deletes files in the upload directory.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl UploadStore {
    /// Create a store rooted at `dir` accepting files up to `max_bytes`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    /// Largest accepted file.
    #[must_use]
    pub const fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Directory files are written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Check size and type without writing anything.
    ///
    /// # Errors
    ///
    /// Returns `Empty`, `TooLarge` or `UnsupportedType`.
    pub fn check(&self, bytes: &[u8]) -> Result<ImageKind, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        if bytes.len() > self.max_bytes {
            return Err(UploadError::TooLarge {
                limit: self.max_bytes,
            });
        }
        ImageKind::sniff(bytes).ok_or(UploadError::UnsupportedType)
    }

    /// Validate and write an image under a fresh name.
    ///
    /// # Errors
    ///
    /// Returns a validation error, or `Io` if the file cannot be written.
    pub async fn save(&self, bytes: &[u8]) -> Result<StoredUpload, UploadError> {
        let kind = self.check(bytes)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let name = format!("{}.{}", Uuid::new_v4().simple(), kind.extension());
        tokio::fs::write(self.dir.join(&name), bytes).await?;

        tracing::info!(file = %name, size = bytes.len(), "Upload stored");
        Ok(StoredUpload {
            url: format!("{URL_PREFIX}{name}"),
            kind,
        })
    }

    /// Delete the file behind an upload URL.
    ///
    /// Foreign URLs and files that are already gone are ignored.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file exists but cannot be removed.
    pub async fn remove(&self, url: &str) -> Result<(), UploadError> {
        let Some(name) = file_name_from_url(url) else {
            return Ok(());
        };

        match tokio::fs::remove_file(self.dir.join(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];
    const WEBP: &[u8] = b"RIFF\x24\x00\x00\x00WEBPVP8 ";
    const GIF: &[u8] = b"GIF89a\x01\x00\x01\x00";

    fn temp_store(max_bytes: usize) -> UploadStore {
        let dir = std::env::temp_dir().join(format!("kilala-uploads-{}", Uuid::new_v4().simple()));
        UploadStore::new(dir, max_bytes)
    }

    #[test]
    fn test_sniff_accepted_formats() {
        assert_eq!(ImageKind::sniff(PNG), Some(ImageKind::Png));
        assert_eq!(ImageKind::sniff(JPEG), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::sniff(WEBP), Some(ImageKind::Webp));
        assert_eq!(ImageKind::sniff(GIF), Some(ImageKind::Gif));
    }

    #[test]
    fn test_sniff_rejects_other_content() {
        assert_eq!(ImageKind::sniff(b"<svg xmlns=\"http://www.w3.org/2000/svg\">"), None);
        assert_eq!(ImageKind::sniff(b"%PDF-1.7"), None);
        assert_eq!(ImageKind::sniff(b"RIFF\x24\x00\x00\x00WAVEfmt "), None);
        assert_eq!(ImageKind::sniff(&[0xFF, 0xD8]), None);
    }

    #[test]
    fn test_check_limits() {
        let store = temp_store(8);
        assert!(matches!(store.check(&[]), Err(UploadError::Empty)));
        assert!(matches!(
            store.check(PNG),
            Err(UploadError::TooLarge { limit: 8 })
        ));
        assert!(matches!(
            temp_store(1024).check(b"hello world"),
            Err(UploadError::UnsupportedType)
        ));
    }

    #[test]
    fn test_file_name_from_url() {
        assert_eq!(file_name_from_url("/uploads/abc123.png"), Some("abc123.png"));
        assert_eq!(file_name_from_url("/uploads/../etc/passwd"), None);
        assert_eq!(file_name_from_url("/uploads/.env"), None);
        assert_eq!(file_name_from_url("/uploads/a/b.png"), None);
        assert_eq!(file_name_from_url("https://cdn.example.com/a.png"), None);
        assert_eq!(file_name_from_url("/uploads/"), None);
    }

    #[test]
    fn test_too_large_message_in_megabytes() {
        let err = UploadError::TooLarge {
            limit: 5 * 1024 * 1024,
        };
        assert!(err.message().contains("5 MB"));
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let store = temp_store(1024);

        let stored = store.save(WEBP).await.unwrap();
        assert_eq!(stored.kind, ImageKind::Webp);
        assert!(stored.url.starts_with(URL_PREFIX));
        assert!(stored.url.ends_with(".webp"));

        let name = file_name_from_url(&stored.url).unwrap();
        let path = store.dir().join(name);
        assert_eq!(tokio::fs::read(&path).await.unwrap(), WEBP);

        store.remove(&stored.url).await.unwrap();
        assert!(!path.exists());

        // Removing twice is fine.
        store.remove(&stored.url).await.unwrap();

        tokio::fs::remove_dir_all(store.dir()).await.unwrap();
    }
}

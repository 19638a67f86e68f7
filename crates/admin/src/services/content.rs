//! Blog post payload validation.

use kilala_core::slug_or_derive;
use serde::Deserialize;

use super::catalog::{ValidationErrors, clean};

/// Longest post title.
const MAX_TITLE_LENGTH: usize = 200;

/// Longest excerpt shown in listings.
const MAX_EXCERPT_LENGTH: usize = 500;

/// Post create/update payload. `content` is markdown.
#[derive(Debug, Clone, Deserialize)]
pub struct PostInput {
    pub title: String,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: String,
    pub cover_image: Option<String>,
    #[serde(default)]
    pub is_published: bool,
}

/// A post payload that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidPost {
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image: Option<String>,
    pub is_published: bool,
}

impl PostInput {
    /// Validate and normalize the payload.
    ///
    /// # Errors
    ///
    /// Returns the failing fields with their messages.
    pub fn validate(self) -> Result<ValidPost, ValidationErrors> {
        let mut errors = Vec::new();

        let title = self.title.trim().to_string();
        if title.is_empty() {
            errors.push(("title", "Vui lòng nhập tiêu đề"));
        } else if title.chars().count() > MAX_TITLE_LENGTH {
            errors.push(("title", "Tiêu đề quá dài"));
        }

        let slug = slug_or_derive(self.slug.as_deref(), &title).unwrap_or_else(|_| {
            errors.push(("slug", "Slug không hợp lệ"));
            String::new()
        });

        let excerpt = clean(self.excerpt);
        if excerpt
            .as_ref()
            .is_some_and(|e| e.chars().count() > MAX_EXCERPT_LENGTH)
        {
            errors.push(("excerpt", "Tóm tắt quá dài"));
        }

        if self.is_published && self.content.trim().is_empty() {
            errors.push(("content", "Bài viết cần có nội dung trước khi xuất bản"));
        }

        if !errors.is_empty() {
            return Err(ValidationErrors(errors));
        }

        Ok(ValidPost {
            title,
            slug,
            excerpt,
            content: self.content,
            cover_image: clean(self.cover_image),
            is_published: self.is_published,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn post() -> PostInput {
        PostInput {
            title: "Cách đeo lens đúng cách".to_string(),
            slug: None,
            excerpt: Some(" Hướng dẫn cho người mới ".to_string()),
            content: "# Bước 1\n\nRửa tay.".to_string(),
            cover_image: Some(String::new()),
            is_published: true,
        }
    }

    #[test]
    fn test_post_normalizes() {
        let valid = post().validate().unwrap();
        assert_eq!(valid.slug, "cach-deo-lens-dung-cach");
        assert_eq!(valid.excerpt.as_deref(), Some("Hướng dẫn cho người mới"));
        assert_eq!(valid.cover_image, None);
    }

    #[test]
    fn test_published_post_needs_content() {
        let mut input = post();
        input.content = "  ".to_string();
        assert!(input.validate().unwrap_err().has("content"));

        let mut draft = post();
        draft.content = String::new();
        draft.is_published = false;
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_post_requires_title() {
        let mut input = post();
        input.title = " ".to_string();
        let errors = input.validate().unwrap_err();
        assert!(errors.has("title"));
        assert!(errors.has("slug"));
    }
}

//! URL slugs from Vietnamese titles.
//!
//! `Kính áp tròng Hàn Quốc - Đen 14.2mm` becomes
//! `kinh-ap-trong-han-quoc-den-14-2mm`.

use thiserror::Error;

/// Longest slug we generate.
pub const MAX_SLUG_LENGTH: usize = 96;

/// The input produced no usable characters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("slug would be empty")]
pub struct SlugError;

/// Map a Vietnamese letter to its base ASCII letter.
///
/// Covers every precomposed vowel with its tone mark in both cases, plus
/// `đ`/`Đ`. Other characters are returned unchanged.
fn fold_vietnamese(c: char) -> char {
    match c {
        'à' | 'á' | 'ả' | 'ã' | 'ạ' | 'ă' | 'ằ' | 'ắ' | 'ẳ' | 'ẵ' | 'ặ' | 'â' | 'ầ' | 'ấ' | 'ẩ'
        | 'ẫ' | 'ậ' => 'a',
        'À' | 'Á' | 'Ả' | 'Ã' | 'Ạ' | 'Ă' | 'Ằ' | 'Ắ' | 'Ẳ' | 'Ẵ' | 'Ặ' | 'Â' | 'Ầ' | 'Ấ' | 'Ẩ'
        | 'Ẫ' | 'Ậ' => 'a',
        'è' | 'é' | 'ẻ' | 'ẽ' | 'ẹ' | 'ê' | 'ề' | 'ế' | 'ể' | 'ễ' | 'ệ' => 'e',
        'È' | 'É' | 'Ẻ' | 'Ẽ' | 'Ẹ' | 'Ê' | 'Ề' | 'Ế' | 'Ể' | 'Ễ' | 'Ệ' => 'e',
        'ì' | 'í' | 'ỉ' | 'ĩ' | 'ị' | 'Ì' | 'Í' | 'Ỉ' | 'Ĩ' | 'Ị' => 'i',
        'ò' | 'ó' | 'ỏ' | 'õ' | 'ọ' | 'ô' | 'ồ' | 'ố' | 'ổ' | 'ỗ' | 'ộ' | 'ơ' | 'ờ' | 'ớ' | 'ở'
        | 'ỡ' | 'ợ' => 'o',
        'Ò' | 'Ó' | 'Ỏ' | 'Õ' | 'Ọ' | 'Ô' | 'Ồ' | 'Ố' | 'Ổ' | 'Ỗ' | 'Ộ' | 'Ơ' | 'Ờ' | 'Ớ' | 'Ở'
        | 'Ỡ' | 'Ợ' => 'o',
        'ù' | 'ú' | 'ủ' | 'ũ' | 'ụ' | 'ư' | 'ừ' | 'ứ' | 'ử' | 'ữ' | 'ự' => 'u',
        'Ù' | 'Ú' | 'Ủ' | 'Ũ' | 'Ụ' | 'Ư' | 'Ừ' | 'Ứ' | 'Ử' | 'Ữ' | 'Ự' => 'u',
        'ỳ' | 'ý' | 'ỷ' | 'ỹ' | 'ỵ' | 'Ỳ' | 'Ý' | 'Ỷ' | 'Ỹ' | 'Ỵ' => 'y',
        'đ' | 'Đ' => 'd',
        other => other,
    }
}

/// Build a URL slug from a title.
///
/// # Errors
///
/// Returns [`SlugError`] when the title contains no ASCII letters or digits
/// after folding diacritics.
///
/// ```
/// use kilala_core::slugify;
///
/// assert_eq!(slugify("Lens Xám Tây 0 độ").unwrap(), "lens-xam-tay-0-do");
/// assert!(slugify("!!!").is_err());
/// ```
pub fn slugify(title: &str) -> Result<String, SlugError> {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars().map(fold_vietnamese) {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.len() > MAX_SLUG_LENGTH {
        slug.truncate(MAX_SLUG_LENGTH);
        while slug.ends_with('-') {
            slug.pop();
        }
    }

    if slug.is_empty() {
        Err(SlugError)
    } else {
        Ok(slug)
    }
}

/// Use an explicit slug when one was supplied, otherwise derive it.
///
/// Explicit slugs are normalized through [`slugify`] as well so that admins
/// cannot store spaces or diacritics.
///
/// # Errors
///
/// Returns [`SlugError`] when neither input yields a slug.
pub fn slug_or_derive(explicit: Option<&str>, title: &str) -> Result<String, SlugError> {
    match explicit.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => slugify(s),
        None => slugify(title),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_folds_vietnamese_diacritics() {
        assert_eq!(
            slugify("Kính áp tròng Hàn Quốc").unwrap(),
            "kinh-ap-trong-han-quoc"
        );
        assert_eq!(slugify("ĐỘ CẬN CAO").unwrap(), "do-can-cao");
        assert_eq!(slugify("Nước ngâm lens Ứng dụng").unwrap(), "nuoc-ngam-lens-ung-dung");
    }

    #[test]
    fn test_collapses_separators() {
        assert_eq!(
            slugify("  Lens   Nâu -- 14.2mm / 3 tháng ").unwrap(),
            "lens-nau-14-2mm-3-thang"
        );
    }

    #[test]
    fn test_drops_unknown_symbols() {
        assert_eq!(slugify("Combo #1 (Sale 50%)").unwrap(), "combo-1-sale-50");
    }

    #[test]
    fn test_empty_is_error() {
        assert_eq!(slugify(""), Err(SlugError));
        assert_eq!(slugify("— ★ —"), Err(SlugError));
    }

    #[test]
    fn test_truncates_without_trailing_dash() {
        let title = "ab ".repeat(60);
        let slug = slugify(&title).unwrap();
        assert!(slug.len() <= MAX_SLUG_LENGTH);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn test_slug_or_derive() {
        assert_eq!(slug_or_derive(None, "Lens Xanh").unwrap(), "lens-xanh");
        assert_eq!(slug_or_derive(Some("  "), "Lens Xanh").unwrap(), "lens-xanh");
        assert_eq!(slug_or_derive(Some("Tùy Chỉnh"), "Lens Xanh").unwrap(), "tuy-chinh");
    }
}

//! Vietnamese phone numbers.

/// Normalize a Vietnamese phone number to its domestic form (`0xxxxxxxxx`).
///
/// Spaces, dots, dashes and parentheses are ignored. A leading `+84` or `84`
/// becomes `0`. The result must be 10 or 11 digits starting with `0`.
///
/// ```
/// use kilala_core::normalize_phone;
///
/// assert_eq!(normalize_phone("+84 912 345 678").as_deref(), Some("0912345678"));
/// assert!(normalize_phone("12345").is_none());
/// ```
#[must_use]
pub fn normalize_phone(input: &str) -> Option<String> {
    let compact: String = input
        .chars()
        .filter(|c| !matches!(c, ' ' | '.' | '-' | '(' | ')'))
        .collect();

    let domestic = if let Some(rest) = compact.strip_prefix("+84") {
        format!("0{rest}")
    } else if compact.starts_with("84") && compact.len() >= 11 {
        format!("0{}", compact.get(2..)?)
    } else {
        compact
    };

    let valid = domestic.starts_with('0')
        && (10..=11).contains(&domestic.len())
        && domestic.chars().all(|c| c.is_ascii_digit());
    valid.then_some(domestic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("0912345678").as_deref(), Some("0912345678"));
        assert_eq!(normalize_phone("+84 912 345 678").as_deref(), Some("0912345678"));
        assert_eq!(normalize_phone("84912345678").as_deref(), Some("0912345678"));
        assert_eq!(normalize_phone("091.234.5678").as_deref(), Some("0912345678"));
        assert_eq!(normalize_phone("(028) 3812-3456").as_deref(), Some("02838123456"));
    }

    #[test]
    fn test_normalize_phone_rejects() {
        assert!(normalize_phone("").is_none());
        assert!(normalize_phone("912345678").is_none());
        assert!(normalize_phone("09123").is_none());
        assert!(normalize_phone("091234567890").is_none());
        assert!(normalize_phone("09123abc78").is_none());
    }
}

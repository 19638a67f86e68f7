//! Human-facing order codes such as `KL250314A1B2C3`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order code printed on invoices and used for guest order lookup.
///
/// Format: `KL` + `yymmdd` + 6 uppercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderCode(String);

impl OrderCode {
    /// Prefix shared by every code.
    pub const PREFIX: &'static str = "KL";

    /// Total length of a code.
    pub const LENGTH: usize = 14;

    /// Generate a fresh code for an order placed at `now`.
    #[must_use]
    pub fn generate(now: DateTime<Utc>) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        let suffix = suffix.get(..6).unwrap_or("000000").to_ascii_uppercase();
        Self(format!("{}{}{suffix}", Self::PREFIX, now.format("%y%m%d")))
    }

    /// Accept a code typed by a customer (case-insensitive, trimmed).
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let code = input.trim().to_ascii_uppercase();
        let well_formed = code.len() == Self::LENGTH
            && code.starts_with(Self::PREFIX)
            && code.chars().skip(2).take(6).all(|c| c.is_ascii_digit())
            && code.chars().skip(8).all(|c| c.is_ascii_hexdigit());
        well_formed.then_some(Self(code))
    }

    /// The code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_generate_format() {
        let now = Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap();
        let code = OrderCode::generate(now);
        assert_eq!(code.as_str().len(), OrderCode::LENGTH);
        assert!(code.as_str().starts_with("KL250314"));
        assert!(OrderCode::parse(code.as_str()).is_some());
    }

    #[test]
    fn test_generate_is_unique_enough() {
        let now = Utc::now();
        assert_ne!(OrderCode::generate(now), OrderCode::generate(now));
    }

    #[test]
    fn test_parse_normalizes() {
        let code = OrderCode::parse("  kl250314a1b2c3 ").unwrap();
        assert_eq!(code.as_str(), "KL250314A1B2C3");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(OrderCode::parse("").is_none());
        assert!(OrderCode::parse("XX250314A1B2C3").is_none());
        assert!(OrderCode::parse("KL25031XA1B2C3").is_none());
        assert!(OrderCode::parse("KL250314A1B2CZ").is_none());
        assert!(OrderCode::parse("KL250314A1B2C").is_none());
    }
}

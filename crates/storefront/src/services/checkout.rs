//! Checkout form validation.

use kilala_core::{Email, PaymentMethod, normalize_phone};
use serde::Deserialize;

/// Longest free-text note accepted with an order.
const MAX_NOTE_LENGTH: usize = 1000;

/// Raw checkout form as posted by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutForm {
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub shipping_address: String,
    pub note: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

/// Checkout details after validation and normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCheckout {
    pub customer_name: String,
    pub email: Email,
    pub phone: String,
    pub shipping_address: String,
    pub note: Option<String>,
    pub payment_method: PaymentMethod,
}

/// Per-field validation failures, in Vietnamese.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutErrors(pub Vec<(&'static str, &'static str)>);

impl CheckoutErrors {
    /// All messages joined for a single error response.
    #[must_use]
    pub fn message(&self) -> String {
        self.0
            .iter()
            .map(|(_, msg)| *msg)
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Whether a given field failed.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|(f, _)| *f == field)
    }
}

impl CheckoutForm {
    /// Validate every field, collecting all failures.
    ///
    /// # Errors
    ///
    /// Returns the list of failing fields with their messages.
    pub fn validate(self) -> Result<ValidCheckout, CheckoutErrors> {
        let mut errors = CheckoutErrors::default();

        let customer_name = self.customer_name.trim().to_string();
        if customer_name.is_empty() {
            errors.0.push(("customer_name", "Vui lòng nhập họ tên"));
        }

        let email = Email::parse(&self.email);
        if email.is_err() {
            errors.0.push(("email", "Email không hợp lệ"));
        }

        let phone = normalize_phone(&self.phone);
        if phone.is_none() {
            errors.0.push(("phone", "Số điện thoại không hợp lệ"));
        }

        let shipping_address = self.shipping_address.trim().to_string();
        if shipping_address.is_empty() {
            errors.0.push(("shipping_address", "Vui lòng nhập địa chỉ giao hàng"));
        }

        let note = self
            .note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        if note.as_ref().is_some_and(|n| n.chars().count() > MAX_NOTE_LENGTH) {
            errors.0.push(("note", "Ghi chú quá dài"));
        }

        match (email, phone) {
            (Ok(email), Some(phone)) if errors.0.is_empty() => Ok(ValidCheckout {
                customer_name,
                email,
                phone,
                shipping_address,
                note,
                payment_method: self.payment_method,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> CheckoutForm {
        CheckoutForm {
            customer_name: "  Nguyễn Thị Lan ".to_string(),
            email: "Lan@Example.VN".to_string(),
            phone: "0912 345 678".to_string(),
            shipping_address: "12 Lý Thường Kiệt, Hà Nội".to_string(),
            note: Some("   ".to_string()),
            payment_method: PaymentMethod::Cod,
        }
    }

    #[test]
    fn test_validate_normalizes() {
        let valid = form().validate().unwrap();
        assert_eq!(valid.customer_name, "Nguyễn Thị Lan");
        assert_eq!(valid.email.as_str(), "lan@example.vn");
        assert_eq!(valid.phone, "0912345678");
        assert_eq!(valid.note, None);
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let mut bad = form();
        bad.customer_name = " ".to_string();
        bad.email = "not-an-email".to_string();
        bad.phone = "123".to_string();
        bad.shipping_address = String::new();

        let errors = bad.validate().unwrap_err();
        assert!(errors.has("customer_name"));
        assert!(errors.has("email"));
        assert!(errors.has("phone"));
        assert!(errors.has("shipping_address"));
        assert!(errors.message().contains("Số điện thoại không hợp lệ"));
    }

    #[test]
    fn test_validate_note_length() {
        let mut long = form();
        long.note = Some("a".repeat(MAX_NOTE_LENGTH + 1));
        assert!(long.validate().unwrap_err().has("note"));
    }
}

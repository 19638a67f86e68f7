//! Validation of admin edits to user accounts.

use kilala_core::{UserId, UserRole, normalize_phone};
use serde::Deserialize;

use super::catalog::{ValidationErrors, clean};
use crate::db::users::UserChanges;

/// Longest display name.
const MAX_NAME_LENGTH: usize = 100;

/// Longest saved address.
const MAX_ADDRESS_LENGTH: usize = 500;

/// `PATCH /users/{id}` payload. Absent or blank fields stay unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdateInput {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Option<UserRole>,
}

impl UserUpdateInput {
    /// Validate and normalize the payload.
    ///
    /// # Errors
    ///
    /// Returns the failing fields with their messages.
    pub fn validate(self) -> Result<UserChanges, ValidationErrors> {
        let mut errors = Vec::new();

        let name = clean(self.name);
        if name
            .as_ref()
            .is_some_and(|n| n.chars().count() > MAX_NAME_LENGTH)
        {
            errors.push(("name", "Tên quá dài"));
        }

        let phone = match clean(self.phone) {
            Some(raw) => normalize_phone(&raw).or_else(|| {
                errors.push(("phone", "Số điện thoại không hợp lệ"));
                None
            }),
            None => None,
        };

        let address = clean(self.address);
        if address
            .as_ref()
            .is_some_and(|a| a.chars().count() > MAX_ADDRESS_LENGTH)
        {
            errors.push(("address", "Địa chỉ quá dài"));
        }

        if !errors.is_empty() {
            return Err(ValidationErrors(errors));
        }

        Ok(UserChanges {
            name,
            phone,
            address,
            role: self.role,
        })
    }
}

/// Reject changes an admin may not make to their own account.
///
/// # Errors
///
/// Returns the message to show when `actor` tries to demote themselves.
pub fn check_self_update(
    actor: UserId,
    target: UserId,
    changes: &UserChanges,
) -> Result<(), &'static str> {
    if actor == target && changes.role.is_some_and(|r| r != UserRole::Admin) {
        return Err("Bạn không thể tự gỡ quyền quản trị của mình");
    }
    Ok(())
}

/// Reject an admin deleting their own account.
///
/// # Errors
///
/// Returns the message to show when `actor == target`.
pub fn check_self_delete(actor: UserId, target: UserId) -> Result<(), &'static str> {
    if actor == target {
        return Err("Bạn không thể tự xóa tài khoản của mình");
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_fields_are_left_unchanged() {
        let changes = UserUpdateInput {
            name: Some("   ".to_string()),
            phone: Some(String::new()),
            address: None,
            role: None,
        }
        .validate()
        .unwrap();

        assert_eq!(changes, UserChanges::default());
    }

    #[test]
    fn test_phone_is_normalized() {
        let changes = UserUpdateInput {
            phone: Some("+84 912.345.678".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();

        assert_eq!(changes.phone.as_deref(), Some("0912345678"));
    }

    #[test]
    fn test_invalid_fields_are_reported() {
        let errors = UserUpdateInput {
            name: Some("a".repeat(MAX_NAME_LENGTH + 1)),
            phone: Some("12345".to_string()),
            address: Some("x".repeat(MAX_ADDRESS_LENGTH + 1)),
            role: None,
        }
        .validate()
        .unwrap_err();

        assert!(errors.has("name"));
        assert!(errors.has("phone"));
        assert!(errors.has("address"));
    }

    #[test]
    fn test_admin_cannot_demote_self() {
        let me = UserId::new(1);
        let demote = UserChanges {
            role: Some(UserRole::Customer),
            ..Default::default()
        };

        assert!(check_self_update(me, me, &demote).is_err());
        assert!(check_self_update(me, UserId::new(2), &demote).is_ok());

        let keep = UserChanges {
            role: Some(UserRole::Admin),
            name: Some("Quản trị".to_string()),
            ..Default::default()
        };
        assert!(check_self_update(me, me, &keep).is_ok());
    }

    #[test]
    fn test_admin_cannot_delete_self() {
        assert!(check_self_delete(UserId::new(3), UserId::new(3)).is_err());
        assert!(check_self_delete(UserId::new(3), UserId::new(4)).is_ok());
    }
}

//! Authentication service.
//!
//! Password accounts for customers, hashed with Argon2id.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use kilala_core::models::User;
use kilala_core::{Email, UserId, normalize_phone};
use serde::Deserialize;
use sqlx::PgPool;

use crate::db::RepositoryError;
use crate::db::users::UserRepository;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length (bounds hashing cost).
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length of a display name.
const MAX_NAME_LENGTH: usize = 100;

/// Maximum length of a saved address.
const MAX_ADDRESS_LENGTH: usize = 500;

/// Profile fields a customer may change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Authentication service.
///
/// Handles customer registration, login and password changes.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new customer with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::InvalidProfile` if the name is empty.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
        phone: Option<&str>,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let name = validate_name(name)?;
        let phone = phone
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| {
                normalize_phone(p)
                    .ok_or_else(|| AuthError::InvalidProfile("Số điện thoại không hợp lệ".to_string()))
            })
            .transpose()?;

        let password_hash = hash_password(password)?;

        self.users
            .create(&email, &password_hash, &name, phone.as_deref())
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_with_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Change a user's password after verifying the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the current password is wrong.
    /// Returns `AuthError::WeakPassword` if the new password doesn't meet requirements.
    pub async fn change_password(
        &self,
        user_id: UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let current_hash = self
            .users
            .get_password_hash(user_id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })?;
        verify_password(current_password, &current_hash)?;
        validate_password(new_password)?;

        let new_hash = hash_password(new_password)?;
        self.users.update_password(user_id, &new_hash).await?;
        Ok(())
    }

    /// Update a customer's profile. `None` leaves a field unchanged.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidProfile` if the name, phone or address is invalid.
    /// Returns `AuthError::UserNotFound` if the user no longer exists.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        update: ProfileUpdate,
    ) -> Result<User, AuthError> {
        let name = update.name.as_deref().map(validate_name).transpose()?;
        let phone = update
            .phone
            .as_deref()
            .map(|p| {
                normalize_phone(p)
                    .ok_or_else(|| AuthError::InvalidProfile("Số điện thoại không hợp lệ".to_string()))
            })
            .transpose()?;
        let address = update.address.as_deref().map(str::trim);
        if address.is_some_and(|a| a.chars().count() > MAX_ADDRESS_LENGTH) {
            return Err(AuthError::InvalidProfile("Địa chỉ quá dài".to_string()));
        }

        self.users
            .update_profile(user_id, name.as_deref(), phone.as_deref(), address)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Mật khẩu phải có ít nhất {MIN_PASSWORD_LENGTH} ký tự"
        )));
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Mật khẩu không được dài quá {MAX_PASSWORD_LENGTH} ký tự"
        )));
    }
    Ok(())
}

/// Trim and validate a display name.
pub(crate) fn validate_name(name: &str) -> Result<String, AuthError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AuthError::InvalidProfile("Vui lòng nhập họ tên".to_string()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AuthError::InvalidProfile("Họ tên quá dài".to_string()));
    }
    Ok(name.to_string())
}

/// Hash a password using Argon2id.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("kinh-ap-trong-2025").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("kinh-ap-trong-2025", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong-password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("whatever", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("1234567").is_err());
        assert!(validate_password("12345678").is_ok());
        // Vietnamese characters count as one each.
        assert!(validate_password("mậtkhẩuu").is_ok());
        assert!(validate_password(&"a".repeat(129)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Trần Minh ").unwrap(), "Trần Minh");
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(101)).is_err());
    }
}

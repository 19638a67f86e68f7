//! Admin authentication service.
//!
//! Admins are rows in `users` with role `admin`; they log in with the same
//! Argon2id password hashes as customers.

mod error;

pub use error::AdminAuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};
use kilala_core::models::User;
use kilala_core::{Email, UserId, UserRole};
use sqlx::PgPool;

use crate::db::UserRepository;

/// Admin authentication service.
pub struct AdminAuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AdminAuthService<'a> {
    /// Create a new admin authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Verify email and password and require the admin role.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` for an unknown email or wrong password,
    /// `NotAdmin` for a valid customer login.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AdminAuthError> {
        let email = Email::parse(email).map_err(|_| AdminAuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_with_password_hash(&email)
            .await?
            .ok_or(AdminAuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        if user.role != UserRole::Admin {
            return Err(AdminAuthError::NotAdmin);
        }
        Ok(user)
    }

    /// Current role of a user, or `None` if the account was deleted.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the query fails.
    pub async fn current_role(&self, id: UserId) -> Result<Option<UserRole>, AdminAuthError> {
        Ok(self.users.role_of(id).await?)
    }
}

/// Verify a password against an Argon2 PHC string.
fn verify_password(password: &str, hash: &str) -> Result<(), AdminAuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AdminAuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AdminAuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use argon2::password_hash::{PasswordHasher, SaltString, rand_core::OsRng};

    use super::*;

    fn hash(password: &str) -> String {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_verify_password() {
        let stored = hash("mật-khẩu-quản-trị");
        assert!(verify_password("mật-khẩu-quản-trị", &stored).is_ok());
        assert!(matches!(
            verify_password("sai", &stored),
            Err(AdminAuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AdminAuthError::InvalidCredentials)
        ));
    }
}

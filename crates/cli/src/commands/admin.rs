//! Admin user management commands.
//!
//! Admins are ordinary `users` rows with `role = 'admin'`; the admin app
//! re-checks the role on every request, so promote/demote take effect
//! immediately.
//!
//! # Usage
//!
//! ```bash
//! kl-cli admin create -e admin@kilalaeye.vn -n "Quản trị" -p 'mat-khau-dai'
//! kl-cli admin promote -e staff@kilalaeye.vn
//! kl-cli admin demote -e staff@kilalaeye.vn
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use kilala_core::{Email, UserId, UserRole};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use thiserror::Error;

use super::{DATABASE_URL_VAR, connect, database_url};

/// Shortest accepted password, same as storefront registration.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid email.
    #[error("Invalid email {email}: {reason}")]
    InvalidEmail { email: String, reason: String },

    /// Display name is blank.
    #[error("Name cannot be empty")]
    EmptyName,

    /// Password too short.
    #[error("Password must be at least {MIN_PASSWORD_LENGTH} characters")]
    WeakPassword,

    /// Hashing failed.
    #[error("Failed to hash password")]
    PasswordHash,

    /// No user has this email.
    #[error("No user with email: {0}")]
    UserNotFound(String),

    /// Demoting would leave nobody able to sign in to the admin.
    #[error("Refusing to demote the last admin: {0}")]
    LastAdmin(String),
}

fn parse_email(email: &str) -> Result<Email, AdminError> {
    Email::parse(email).map_err(|e| AdminError::InvalidEmail {
        email: email.to_owned(),
        reason: e.to_string(),
    })
}

/// Check the `create` arguments before touching the database.
fn validate_new_admin(
    email: &str,
    name: &str,
    password: &SecretString,
) -> Result<(Email, String), AdminError> {
    let email = parse_email(email)?;

    let name = name.trim();
    if name.is_empty() {
        return Err(AdminError::EmptyName);
    }

    if password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AdminError::WeakPassword);
    }

    Ok((email, name.to_owned()))
}

/// Hash a password with Argon2id, as the storefront does at registration.
fn hash_password(password: &SecretString) -> Result<String, AdminError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.expose_secret().as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AdminError::PasswordHash)
}

async fn pool() -> Result<PgPool, AdminError> {
    let database_url = database_url().ok_or(AdminError::MissingEnvVar(DATABASE_URL_VAR))?;
    Ok(connect(&database_url).await?)
}

/// Create an admin user, or promote an existing user and reset the password.
///
/// An existing user keeps their name; only role and password change.
///
/// # Errors
///
/// Returns an error for invalid arguments or database failures.
pub async fn create_user(
    email: &str,
    name: &str,
    password: SecretString,
) -> Result<UserId, AdminError> {
    let (email, name) = validate_new_admin(email, name, &password)?;
    let password_hash = hash_password(&password)?;

    let pool = pool().await?;

    // xmax is 0 only for a freshly inserted tuple
    let (user_id, inserted): (UserId, bool) = sqlx::query_as(
        r"
        INSERT INTO users (email, password_hash, name, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE
            SET password_hash = EXCLUDED.password_hash,
                role = EXCLUDED.role,
                updated_at = now()
        RETURNING id, (xmax = 0) AS inserted
        ",
    )
    .bind(&email)
    .bind(&password_hash)
    .bind(&name)
    .bind(UserRole::Admin)
    .fetch_one(&pool)
    .await?;

    if inserted {
        tracing::info!(%user_id, %email, "Admin user created");
    } else {
        tracing::info!(%user_id, %email, "Existing user promoted to admin and password reset");
    }

    Ok(user_id)
}

/// Grant the admin role to an existing user.
///
/// # Errors
///
/// Returns [`AdminError::UserNotFound`] when the email is unknown.
pub async fn promote(email: &str) -> Result<(), AdminError> {
    let email = parse_email(email)?;
    let pool = pool().await?;

    set_role(&pool, &email, UserRole::Admin).await?;
    tracing::info!(%email, "User promoted to admin");
    Ok(())
}

/// Revoke the admin role.
///
/// # Errors
///
/// Returns [`AdminError::LastAdmin`] when this is the only admin left, or
/// [`AdminError::UserNotFound`] when the email is unknown.
pub async fn demote(email: &str) -> Result<(), AdminError> {
    let email = parse_email(email)?;
    let pool = pool().await?;

    let other_admins: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = $1 AND email <> $2")
            .bind(UserRole::Admin)
            .bind(&email)
            .fetch_one(&pool)
            .await?;
    if other_admins == 0 {
        return Err(AdminError::LastAdmin(email.into_inner()));
    }

    set_role(&pool, &email, UserRole::Customer).await?;
    tracing::info!(%email, "Admin role revoked");
    Ok(())
}

async fn set_role(pool: &PgPool, email: &Email, role: UserRole) -> Result<(), AdminError> {
    let result = sqlx::query("UPDATE users SET role = $2, updated_at = now() WHERE email = $1")
        .bind(email)
        .bind(role)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AdminError::UserNotFound(email.to_string()));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use argon2::{PasswordHash, PasswordVerifier};

    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_owned())
    }

    #[test]
    fn test_validate_new_admin_normalizes() {
        let (email, name) =
            validate_new_admin(" Admin@KilalaEye.vn ", "  Quản trị ", &secret("12345678")).unwrap();
        assert_eq!(email.as_str(), "admin@kilalaeye.vn");
        assert_eq!(name, "Quản trị");
    }

    #[test]
    fn test_validate_new_admin_rejects_bad_input() {
        assert!(matches!(
            validate_new_admin("not-an-email", "A", &secret("12345678")),
            Err(AdminError::InvalidEmail { .. })
        ));
        assert!(matches!(
            validate_new_admin("a@kilalaeye.vn", "   ", &secret("12345678")),
            Err(AdminError::EmptyName)
        ));
        assert!(matches!(
            validate_new_admin("a@kilalaeye.vn", "A", &secret("1234567")),
            Err(AdminError::WeakPassword)
        ));
    }

    #[test]
    fn test_password_length_counts_characters() {
        // 8 Vietnamese letters are more than 8 bytes but exactly 8 characters
        assert!(validate_new_admin("a@kilalaeye.vn", "A", &secret("đđđđđđđđ")).is_ok());
    }

    #[test]
    fn test_hash_password_verifies() {
        let hash = hash_password(&secret("mat-khau-dai")).unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"mat-khau-dai", &parsed)
                .is_ok()
        );
        assert!(hash.starts_with("$argon2id$"));
    }
}

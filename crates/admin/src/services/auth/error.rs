//! Admin authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during admin authentication.
#[derive(Debug, Error)]
pub enum AdminAuthError {
    /// Wrong email or password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The account exists but is not an admin.
    #[error("account is not an admin")]
    NotAdmin,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

//! Session-related types for admin authentication.

use serde::{Deserialize, Serialize};

use kilala_core::{Email, UserId};

/// Session-stored admin identity.
///
/// The role is not cached here; it is re-read from `users` on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// User ID of the admin account.
    pub id: UserId,
    /// Admin's email address.
    pub email: Email,
    /// Admin's display name.
    pub name: String,
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";
}

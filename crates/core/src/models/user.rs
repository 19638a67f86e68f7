//! Account rows.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{Email, UserId, UserRole};

/// A customer or admin account.
///
/// The password hash is not part of this row; repositories
/// that verify passwords select it separately.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether this account may use the admin API.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

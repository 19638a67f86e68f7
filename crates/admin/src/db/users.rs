//! User account management.

use kilala_core::models::User;
use kilala_core::{Email, Page, PageParams, UserId, UserRole};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{RepositoryError, like_pattern, rows_affected_or_not_found};

const USER_COLUMNS: &str = "id, email, name, phone, address, role, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserWithHash {
    #[sqlx(flatten)]
    user: User,
    password_hash: String,
}

/// A user row with their order count, for listings.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserSummary {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub user: User,
    pub order_count: i64,
}

/// Filters for the user listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    pub q: Option<String>,
    pub role: Option<UserRole>,
}

/// Validated changes to a user. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Option<UserRole>,
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    if let Some(role) = filter.role {
        builder.push(" AND u.role = ").push_bind(role);
    }
    if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = like_pattern(q);
        builder
            .push(" AND (u.email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.phone ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user and their password hash by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithHash>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| (r.user, r.password_hash)))
    }

    /// Current role of a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn role_of(&self, id: UserId) -> Result<Option<UserRole>, RepositoryError> {
        let role = sqlx::query_scalar::<_, UserRole>("SELECT role FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(role)
    }

    /// Users matching `filter` with their order counts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &UserFilter,
        params: &PageParams,
    ) -> Result<Page<UserSummary>, RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users u WHERE TRUE");
        push_filters(&mut count, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT u.id, u.email, u.name, u.phone, u.address, u.role, u.created_at, \
             u.updated_at, \
             (SELECT COUNT(*) FROM orders o WHERE o.user_id = u.id) AS order_count \
             FROM users u WHERE TRUE",
        );
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY u.created_at DESC, u.id DESC LIMIT ")
            .push_bind(params.limit())
            .push(" OFFSET ")
            .push_bind(params.offset());

        let items = query.build_query_as::<UserSummary>().fetch_all(self.pool).await?;
        Ok(Page::new(items, params, total))
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    /// Apply changes to a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn update(&self, id: UserId, changes: &UserChanges) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET \
                name = COALESCE($2, name), \
                phone = COALESCE($3, phone), \
                address = COALESCE($4, address), \
                role = COALESCE($5, role), \
                updated_at = now() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.phone.as_deref())
        .bind(changes.address.as_deref())
        .bind(changes.role)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a user. Their orders keep the snapshot with `user_id` cleared;
    /// their reviews are removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        rows_affected_or_not_found(result.rows_affected())
    }
}

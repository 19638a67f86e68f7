//! Session middleware configuration for admin.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions with
//! stricter security settings than the storefront (SameSite=Strict, 24hr
//! expiry) and a separate table, `tower_sessions.admin_session`.

use cookie::Key;
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use tower_sessions::cookie::SameSite;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::AdminConfig;

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "kl_admin_session";

/// Session expiry time in seconds (24 hours - stricter than storefront).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Create the session layer with `PostgreSQL` store.
///
/// # Arguments
///
/// * `pool` - `PostgreSQL` connection pool
/// * `config` - Admin configuration (HTTPS mode and signing secret)
///
/// # Panics
///
/// Panics if the schema name or table name is invalid (should never happen
/// with hardcoded "`tower_sessions`" and "`admin_session`" values).
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &AdminConfig,
) -> SessionManagerLayer<PostgresStore, tower_sessions::service::SignedCookie> {
    // The table is created by the sessions migration.
    let store = PostgresStore::new(pool.clone())
        .with_schema_name("tower_sessions")
        .expect("valid schema name")
        .with_table_name("admin_session")
        .expect("valid table name");
    let key = signing_key(&config.session_secret);

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        // SameSite=Strict for admin (stricter than storefront's Lax)
        .with_same_site(SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key)
}

/// Cookie signing key derived from the session secret.
///
/// The secret is at least 32 bytes (checked when the config loads), which
/// is the minimum `Key::derive_from` accepts.
fn signing_key(secret: &SecretString) -> Key {
    Key::derive_from(secret.expose_secret().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_key_is_stable_per_secret() {
        let secret = SecretString::from("kX9#mP2$vL7@nQ4&wR8!tY3*hJ6^bF1%");
        let other = SecretString::from("Zq8!uE5@rT1#yW3$iO6%pA9^sD2&fG4*");

        assert_eq!(
            signing_key(&secret).signing(),
            signing_key(&secret).signing()
        );
        assert_ne!(
            signing_key(&secret).signing(),
            signing_key(&other).signing()
        );
    }
}

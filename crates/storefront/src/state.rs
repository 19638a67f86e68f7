//! Application state shared across handlers.

use std::sync::Arc;

use kilala_core::ShippingPolicy;
use sqlx::PgPool;

use crate::cache::NavCache;
use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    nav_cache: NavCache,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                nav_cache: NavCache::new(),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the navigation cache.
    #[must_use]
    pub fn nav_cache(&self) -> &NavCache {
        &self.inner.nav_cache
    }

    /// Shipping fee rule.
    #[must_use]
    pub fn shipping(&self) -> &ShippingPolicy {
        &self.inner.config.shipping
    }
}

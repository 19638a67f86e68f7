//! In-process cache for navigation lists.
//!
//! Categories, collections and tags change rarely and are requested on
//! every page, so their lists are cached for 5 minutes with `moka`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use crate::db::RepositoryError;
use crate::models::NavItem;

/// Time a navigation list stays cached.
const NAV_TTL: Duration = Duration::from_secs(300);

/// Cache key for navigation lists.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Categories,
    Collections,
    Tags,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Nav(Arc<Vec<NavItem>>),
}

/// Navigation cache shared through `AppState`.
#[derive(Clone)]
pub struct NavCache {
    cache: Cache<CacheKey, CacheValue>,
}

impl NavCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(16)
                .time_to_live(NAV_TTL)
                .build(),
        }
    }

    /// Return the cached list for `key`, loading it with `load` on a miss.
    ///
    /// Failed loads are not cached.
    ///
    /// # Errors
    ///
    /// Returns the loader's error on a miss.
    pub async fn get_or_load<F, Fut>(
        &self,
        key: CacheKey,
        load: F,
    ) -> Result<Arc<Vec<NavItem>>, RepositoryError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<NavItem>, RepositoryError>>,
    {
        if let Some(CacheValue::Nav(items)) = self.cache.get(&key).await {
            tracing::debug!(?key, "Navigation cache hit");
            return Ok(items);
        }

        let items = Arc::new(load().await?);
        self.cache
            .insert(key, CacheValue::Nav(Arc::clone(&items)))
            .await;
        Ok(items)
    }
}

impl Default for NavCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn item(slug: &str) -> NavItem {
        NavItem {
            id: 1,
            name: slug.to_uppercase(),
            slug: slug.to_string(),
            image_url: None,
            product_count: 3,
        }
    }

    #[tokio::test]
    async fn test_second_read_is_served_from_cache() {
        let cache = NavCache::new();
        let loads = AtomicUsize::new(0);

        for _ in 0..2 {
            let items = cache
                .get_or_load(CacheKey::Categories, || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![item("lens-can")])
                })
                .await
                .unwrap();
            assert_eq!(items.len(), 1);
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let cache = NavCache::new();
        cache
            .get_or_load(CacheKey::Tags, || async { Ok(vec![item("hot")]) })
            .await
            .unwrap();
        let collections = cache
            .get_or_load(CacheKey::Collections, || async { Ok(Vec::new()) })
            .await
            .unwrap();
        assert!(collections.is_empty());
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = NavCache::new();
        let failed = cache
            .get_or_load(CacheKey::Tags, || async { Err(RepositoryError::NotFound) })
            .await;
        assert!(failed.is_err());

        let items = cache
            .get_or_load(CacheKey::Tags, || async { Ok(vec![item("sale")]) })
            .await
            .unwrap();
        assert_eq!(items.first().unwrap().slug, "sale");
    }
}

//! Category, collection and tag reads.

use kilala_core::models::{Category, Collection};
use kilala_core::{CategoryId, CollectionId};
use sqlx::PgPool;

use super::RepositoryError;
use crate::models::NavItem;

/// Repository for the catalog taxonomies.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Categories in navigation order with their active product counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn category_nav(&self) -> Result<Vec<NavItem>, RepositoryError> {
        let items = sqlx::query_as::<_, NavItem>(
            "SELECT c.id, c.name, c.slug, c.image_url, \
                COUNT(p.id) FILTER (WHERE p.is_active) AS product_count \
             FROM categories c LEFT JOIN products p ON p.category_id = c.id \
             GROUP BY c.id ORDER BY c.position, c.name",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// Collections with their active product counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn collection_nav(&self) -> Result<Vec<NavItem>, RepositoryError> {
        let items = sqlx::query_as::<_, NavItem>(
            "SELECT c.id, c.name, c.slug, c.image_url, \
                COUNT(p.id) FILTER (WHERE p.is_active) AS product_count \
             FROM collections c LEFT JOIN products p ON p.collection_id = c.id \
             GROUP BY c.id ORDER BY c.created_at DESC, c.id DESC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// Tags with their active product counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn tag_nav(&self) -> Result<Vec<NavItem>, RepositoryError> {
        let items = sqlx::query_as::<_, NavItem>(
            "SELECT t.id, t.name, t.slug, NULL::text AS image_url, \
                COUNT(p.id) FILTER (WHERE p.is_active) AS product_count \
             FROM tags t \
             LEFT JOIN product_tags pt ON pt.tag_id = t.id \
             LEFT JOIN products p ON p.id = pt.product_id \
             GROUP BY t.id ORDER BY t.name",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// Get a category by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn category_by_slug(&self, slug: &str) -> Result<Option<Category>, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, description, image_url, position, created_at, updated_at \
             FROM categories WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(category)
    }

    /// Get a category by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn category_by_id(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, description, image_url, position, created_at, updated_at \
             FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(category)
    }

    /// Get a collection by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn collection_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Collection>, RepositoryError> {
        let collection = sqlx::query_as::<_, Collection>(
            "SELECT id, name, slug, description, image_url, created_at, updated_at \
             FROM collections WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(collection)
    }

    /// Get a collection by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn collection_by_id(
        &self,
        id: CollectionId,
    ) -> Result<Option<Collection>, RepositoryError> {
        let collection = sqlx::query_as::<_, Collection>(
            "SELECT id, name, slug, description, image_url, created_at, updated_at \
             FROM collections WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(collection)
    }
}

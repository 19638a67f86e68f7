//! Categories, collections and tags.
//!
//! Deleting a category or collection leaves its products unfiled; deleting a
//! tag detaches it from every product.

use kilala_core::models::{Category, Collection, Tag};
use kilala_core::{CategoryId, CollectionId, TagId};
use serde::Serialize;
use sqlx::PgPool;

use super::{RepositoryError, rows_affected_or_not_found};
use crate::services::catalog::ValidTaxonomy;

const CATEGORY_COLUMNS: &str =
    "id, name, slug, description, image_url, position, created_at, updated_at";
const COLLECTION_COLUMNS: &str = "id, name, slug, description, image_url, created_at, updated_at";
const TAG_COLUMNS: &str = "id, name, slug";

/// A category with the number of products filed under it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategoryRow {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub category: Category,
    pub product_count: i64,
}

/// A collection with the number of products in it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CollectionRow {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub collection: Collection,
    pub product_count: i64,
}

/// A tag with the number of products carrying it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TagRow {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub tag: Tag,
    pub product_count: i64,
}

/// Repository for categories.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<CategoryRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT c.id, c.name, c.slug, c.description, c.image_url, c.position, \
             c.created_at, c.updated_at, \
             (SELECT COUNT(*) FROM products p WHERE p.category_id = c.id) AS product_count \
             FROM categories c ORDER BY c.position, c.name",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Get a category by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(category)
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create(&self, input: &ValidTaxonomy) -> Result<Category, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "INSERT INTO categories (name, slug, description, image_url, position) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(&input.slug)
        .bind(input.description.as_deref())
        .bind(input.image_url.as_deref())
        .bind(input.position)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "Slug"))?;

        tracing::info!(category_id = %category.id, slug = %category.slug, "Category created");
        Ok(category)
    }

    /// Overwrite a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist, or
    /// `RepositoryError::Conflict` if the slug is taken.
    pub async fn update(
        &self,
        id: CategoryId,
        input: &ValidTaxonomy,
    ) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, Category>(&format!(
            "UPDATE categories SET name = $2, slug = $3, description = $4, image_url = $5, \
                position = $6, updated_at = now() \
             WHERE id = $1 RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(input.description.as_deref())
        .bind(input.image_url.as_deref())
        .bind(input.position)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "Slug"))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    pub async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        rows_affected_or_not_found(result.rows_affected())
    }
}

/// Repository for collections.
pub struct CollectionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CollectionRepository<'a> {
    /// Create a new collection repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All collections by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<CollectionRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, CollectionRow>(
            "SELECT c.id, c.name, c.slug, c.description, c.image_url, c.created_at, \
             c.updated_at, \
             (SELECT COUNT(*) FROM products p WHERE p.collection_id = c.id) AS product_count \
             FROM collections c ORDER BY c.name",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Get a collection by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CollectionId) -> Result<Option<Collection>, RepositoryError> {
        let collection = sqlx::query_as::<_, Collection>(&format!(
            "SELECT {COLLECTION_COLUMNS} FROM collections WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(collection)
    }

    /// Create a collection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create(&self, input: &ValidTaxonomy) -> Result<Collection, RepositoryError> {
        let collection = sqlx::query_as::<_, Collection>(&format!(
            "INSERT INTO collections (name, slug, description, image_url) \
             VALUES ($1, $2, $3, $4) RETURNING {COLLECTION_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(&input.slug)
        .bind(input.description.as_deref())
        .bind(input.image_url.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "Slug"))?;

        tracing::info!(collection_id = %collection.id, slug = %collection.slug, "Collection created");
        Ok(collection)
    }

    /// Overwrite a collection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the collection does not exist,
    /// or `RepositoryError::Conflict` if the slug is taken.
    pub async fn update(
        &self,
        id: CollectionId,
        input: &ValidTaxonomy,
    ) -> Result<Collection, RepositoryError> {
        sqlx::query_as::<_, Collection>(&format!(
            "UPDATE collections SET name = $2, slug = $3, description = $4, image_url = $5, \
                updated_at = now() \
             WHERE id = $1 RETURNING {COLLECTION_COLUMNS}"
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(input.description.as_deref())
        .bind(input.image_url.as_deref())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "Slug"))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a collection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the collection does not exist.
    pub async fn delete(&self, id: CollectionId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM collections WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        rows_affected_or_not_found(result.rows_affected())
    }
}

/// Repository for tags.
pub struct TagRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TagRepository<'a> {
    /// Create a new tag repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All tags by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<TagRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, TagRow>(
            "SELECT t.id, t.name, t.slug, \
             (SELECT COUNT(*) FROM product_tags pt WHERE pt.tag_id = t.id) AS product_count \
             FROM tags t ORDER BY t.name",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Get a tag by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: TagId) -> Result<Option<Tag>, RepositoryError> {
        let tag = sqlx::query_as::<_, Tag>(&format!("SELECT {TAG_COLUMNS} FROM tags WHERE id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(tag)
    }

    /// Create a tag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create(&self, input: &ValidTaxonomy) -> Result<Tag, RepositoryError> {
        let tag = sqlx::query_as::<_, Tag>(&format!(
            "INSERT INTO tags (name, slug) VALUES ($1, $2) RETURNING {TAG_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(&input.slug)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "Slug"))?;
        Ok(tag)
    }

    /// Rename a tag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the tag does not exist, or
    /// `RepositoryError::Conflict` if the slug is taken.
    pub async fn update(&self, id: TagId, input: &ValidTaxonomy) -> Result<Tag, RepositoryError> {
        sqlx::query_as::<_, Tag>(&format!(
            "UPDATE tags SET name = $2, slug = $3 WHERE id = $1 RETURNING {TAG_COLUMNS}"
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.slug)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "Slug"))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a tag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the tag does not exist.
    pub async fn delete(&self, id: TagId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        rows_affected_or_not_found(result.rows_affected())
    }
}

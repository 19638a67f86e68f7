//! Product administration.
//!
//! A product is written together with its attributes and tags: both are
//! replaced as a whole inside the same transaction as the product row.

use kilala_core::models::{Product, ProductAttribute, ProductImage, Tag};
use kilala_core::{CategoryId, CollectionId, Page, PageParams, ProductId};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use super::{RepositoryError, like_pattern};
use crate::services::catalog::ValidProduct;

const PRODUCT_COLUMNS: &str = "id, name, slug, sku, brand, short_description, description, \
    price, sale_price, stock, category_id, collection_id, is_active, is_featured, \
    created_at, updated_at";

/// Filters for the admin product listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    /// Matches name, SKU or brand.
    pub q: Option<String>,
    pub category_id: Option<CategoryId>,
    pub collection_id: Option<CollectionId>,
    pub is_active: Option<bool>,
}

/// A product row with the names it is filed under and its first image.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductRow {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub product: Product,
    pub category_name: Option<String>,
    pub collection_name: Option<String>,
    pub image_url: Option<String>,
}

/// A product with everything the edit form needs.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub images: Vec<ProductImage>,
    pub attributes: Vec<ProductAttribute>,
    pub tags: Vec<Tag>,
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    if let Some(category_id) = filter.category_id {
        builder.push(" AND p.category_id = ").push_bind(category_id);
    }
    if let Some(collection_id) = filter.collection_id {
        builder.push(" AND p.collection_id = ").push_bind(collection_id);
    }
    if let Some(is_active) = filter.is_active {
        builder.push(" AND p.is_active = ").push_bind(is_active);
    }
    if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = like_pattern(q);
        builder
            .push(" AND (p.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.sku ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.brand ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Map write failures, naming the duplicated field.
fn write_error(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        let what = if db_err.constraint() == Some("products_sku_key") {
            "SKU"
        } else {
            "Slug"
        };
        return RepositoryError::Conflict(format!("{what} đã tồn tại"));
    }
    RepositoryError::from_unique(err, "Sản phẩm")
}

/// Repository for product administration.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Products matching `filter`, active or not, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        params: &PageParams,
    ) -> Result<Page<ProductRow>, RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products p WHERE TRUE");
        push_filters(&mut count, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT p.id, p.name, p.slug, p.sku, p.brand, p.short_description, p.description, \
             p.price, p.sale_price, p.stock, p.category_id, p.collection_id, p.is_active, \
             p.is_featured, p.created_at, p.updated_at, \
             c.name AS category_name, col.name AS collection_name, \
             (SELECT i.url FROM product_images i WHERE i.product_id = p.id \
                ORDER BY i.position, i.id LIMIT 1) AS image_url \
             FROM products p \
             LEFT JOIN categories c ON c.id = p.category_id \
             LEFT JOIN collections col ON col.id = p.collection_id \
             WHERE TRUE",
        );
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ")
            .push_bind(params.limit())
            .push(" OFFSET ")
            .push_bind(params.offset());

        let items = query.build_query_as::<ProductRow>().fetch_all(self.pool).await?;
        Ok(Page::new(items, params, total))
    }

    /// A product with its images, attributes and tags.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<ProductDetail>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(product) = product else {
            return Ok(None);
        };

        let (images, attributes, tags) = tokio::try_join!(
            sqlx::query_as::<_, ProductImage>(
                "SELECT id, product_id, url, alt, position FROM product_images \
                 WHERE product_id = $1 ORDER BY position, id",
            )
            .bind(id)
            .fetch_all(self.pool),
            sqlx::query_as::<_, ProductAttribute>(
                "SELECT id, product_id, name, value, position FROM product_attributes \
                 WHERE product_id = $1 ORDER BY position, id",
            )
            .bind(id)
            .fetch_all(self.pool),
            sqlx::query_as::<_, Tag>(
                "SELECT t.id, t.name, t.slug FROM tags t \
                 JOIN product_tags pt ON pt.tag_id = t.id \
                 WHERE pt.product_id = $1 ORDER BY t.name",
            )
            .bind(id)
            .fetch_all(self.pool),
        )?;

        Ok(Some(ProductDetail {
            product,
            images,
            attributes,
            tags,
        }))
    }

    /// Whether a product exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)")
                .bind(id)
                .fetch_one(self.pool)
                .await?;
        Ok(exists)
    }

    /// Create a product with its attributes and tags.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` for a duplicate slug or SKU, or an
    /// unknown category, collection or tag.
    pub async fn create(&self, input: &ValidProduct) -> Result<ProductDetail, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query_scalar::<_, ProductId>(
            "INSERT INTO products (name, slug, sku, brand, short_description, description, \
                price, sale_price, stock, category_id, collection_id, is_active, is_featured) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING id",
        )
        .bind(&input.name)
        .bind(&input.slug)
        .bind(input.sku.as_deref())
        .bind(input.brand.as_deref())
        .bind(input.short_description.as_deref())
        .bind(input.description.as_deref())
        .bind(input.price)
        .bind(input.sale_price)
        .bind(input.stock)
        .bind(input.category_id)
        .bind(input.collection_id)
        .bind(input.is_active)
        .bind(input.is_featured)
        .fetch_one(&mut *tx)
        .await
        .map_err(write_error)?;

        replace_children(&mut tx, id, input).await?;
        tx.commit().await?;

        tracing::info!(product_id = %id, slug = %input.slug, "Product created");
        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Overwrite a product, its attributes and its tags.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist,
    /// `RepositoryError::Conflict` as for [`create`](Self::create).
    pub async fn update(
        &self,
        id: ProductId,
        input: &ValidProduct,
    ) -> Result<ProductDetail, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE products SET name = $2, slug = $3, sku = $4, brand = $5, \
                short_description = $6, description = $7, price = $8, sale_price = $9, \
                stock = $10, category_id = $11, collection_id = $12, is_active = $13, \
                is_featured = $14, updated_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(input.sku.as_deref())
        .bind(input.brand.as_deref())
        .bind(input.short_description.as_deref())
        .bind(input.description.as_deref())
        .bind(input.price)
        .bind(input.sale_price)
        .bind(input.stock)
        .bind(input.category_id)
        .bind(input.collection_id)
        .bind(input.is_active)
        .bind(input.is_featured)
        .execute(&mut *tx)
        .await
        .map_err(write_error)?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        replace_children(&mut tx, id, input).await?;
        tx.commit().await?;

        tracing::info!(product_id = %id, "Product updated");
        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a product. Returns the URLs of its images so the files can be
    /// removed; order lines keep their snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn delete(&self, id: ProductId) -> Result<Vec<String>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let urls = sqlx::query_scalar::<_, String>(
            "SELECT url FROM product_images WHERE product_id = $1",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let deleted = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        tracing::info!(product_id = %id, "Product deleted");
        Ok(urls)
    }
}

/// Replace attributes and tags of a product inside `tx`.
async fn replace_children(
    tx: &mut Transaction<'_, Postgres>,
    id: ProductId,
    input: &ValidProduct,
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM product_attributes WHERE product_id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await?;

    if !input.attributes.is_empty() {
        let names: Vec<&str> = input.attributes.iter().map(|a| a.name.as_str()).collect();
        let values: Vec<&str> = input.attributes.iter().map(|a| a.value.as_str()).collect();

        sqlx::query(
            "INSERT INTO product_attributes (product_id, name, value, position) \
             SELECT $1, a.name, a.value, (a.ord - 1)::int \
             FROM UNNEST($2::text[], $3::text[]) WITH ORDINALITY AS a(name, value, ord)",
        )
        .bind(id)
        .bind(&names)
        .bind(&values)
        .execute(&mut **tx)
        .await?;
    }

    sqlx::query("DELETE FROM product_tags WHERE product_id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await?;

    if !input.tag_ids.is_empty() {
        let tag_ids: Vec<i32> = input.tag_ids.iter().map(|t| t.as_i32()).collect();

        sqlx::query(
            "INSERT INTO product_tags (product_id, tag_id) \
             SELECT $1, UNNEST($2::int4[])",
        )
        .bind(id)
        .bind(&tag_ids)
        .execute(&mut **tx)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "Thẻ"))?;
    }

    Ok(())
}

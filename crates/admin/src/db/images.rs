//! Product image rows. The files themselves live in the upload directory.

use std::collections::BTreeSet;

use kilala_core::models::ProductImage;
use kilala_core::{ProductId, ProductImageId};
use sqlx::PgPool;

use super::RepositoryError;

const IMAGE_COLUMNS: &str = "id, product_id, url, alt, position";

/// Repository for product images.
pub struct ImageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ImageRepository<'a> {
    /// Create a new image repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Images of a product in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, product_id: ProductId) -> Result<Vec<ProductImage>, RepositoryError> {
        let images = sqlx::query_as::<_, ProductImage>(&format!(
            "SELECT {IMAGE_COLUMNS} FROM product_images \
             WHERE product_id = $1 ORDER BY position, id"
        ))
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;
        Ok(images)
    }

    /// Append images after the product's last one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn append(
        &self,
        product_id: ProductId,
        urls: &[String],
        alt: Option<&str>,
    ) -> Result<Vec<ProductImage>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Lock the product so concurrent uploads get distinct positions.
        sqlx::query_scalar::<_, ProductId>("SELECT id FROM products WHERE id = $1 FOR UPDATE")
            .bind(product_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let next = sqlx::query_scalar::<_, i32>(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM product_images WHERE product_id = $1",
        )
        .bind(product_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO product_images (product_id, url, alt, position) \
             SELECT $1, u.url, $3, $4 + (u.ord - 1)::int \
             FROM UNNEST($2::text[]) WITH ORDINALITY AS u(url, ord)",
        )
        .bind(product_id)
        .bind(urls)
        .bind(alt)
        .bind(next)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(product_id = %product_id, count = urls.len(), "Product images added");

        self.list(product_id).await
    }

    /// Reorder a product's images. `image_ids` must list every image of the
    /// product exactly once.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the list does not match the
    /// product's images.
    pub async fn reorder(
        &self,
        product_id: ProductId,
        image_ids: &[ProductImageId],
    ) -> Result<Vec<ProductImage>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: BTreeSet<i32> = sqlx::query_scalar::<_, i32>(
            "SELECT id FROM product_images WHERE product_id = $1 FOR UPDATE",
        )
        .bind(product_id)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .collect();

        let requested: Vec<i32> = image_ids.iter().map(ProductImageId::as_i32).collect();
        let requested_set: BTreeSet<i32> = requested.iter().copied().collect();

        if requested_set.len() != requested.len() || requested_set != current {
            return Err(RepositoryError::Conflict(
                "Danh sách ảnh không khớp với sản phẩm".to_string(),
            ));
        }

        sqlx::query(
            "UPDATE product_images i SET position = (r.ord - 1)::int \
             FROM UNNEST($2::int4[]) WITH ORDINALITY AS r(id, ord) \
             WHERE i.id = r.id AND i.product_id = $1",
        )
        .bind(product_id)
        .bind(&requested)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.list(product_id).await
    }

    /// Delete one image, returning its URL.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the image does not belong to
    /// the product.
    pub async fn delete(
        &self,
        product_id: ProductId,
        image_id: ProductImageId,
    ) -> Result<String, RepositoryError> {
        sqlx::query_scalar::<_, String>(
            "DELETE FROM product_images WHERE id = $1 AND product_id = $2 RETURNING url",
        )
        .bind(image_id)
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }
}

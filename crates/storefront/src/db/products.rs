//! Product queries for listings, product pages, search and the cart.

use std::collections::HashMap;

use kilala_core::models::{Product, ProductAttribute, ProductImage, Tag};
use kilala_core::{CategoryId, Page, PageParams, ProductId};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{RepositoryError, like_pattern};
use crate::models::{ProductCard, ProductCardRow, ProductFilter, ProductSort};
use crate::services::cart::CartProduct;

/// Columns for a product card, selected from `products p`.
const CARD_SELECT: &str = "SELECT p.id, p.name, p.slug, p.brand, p.price, p.sale_price, p.stock, \
    (SELECT i.url FROM product_images i WHERE i.product_id = p.id \
        ORDER BY i.position, i.id LIMIT 1) AS image_url, \
    (SELECT AVG(r.rating)::float8 FROM reviews r \
        WHERE r.product_id = p.id AND r.is_approved) AS avg_rating, \
    (SELECT COUNT(*) FROM reviews r \
        WHERE r.product_id = p.id AND r.is_approved) AS review_count \
    FROM products p";

const PRODUCT_COLUMNS: &str = "id, name, slug, sku, brand, short_description, description, \
    price, sale_price, stock, category_id, collection_id, is_active, is_featured, \
    created_at, updated_at";

/// Append `AND ...` clauses for every filter that is set.
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    if let Some(category) = &filter.category {
        builder
            .push(" AND p.category_id = (SELECT id FROM categories WHERE slug = ")
            .push_bind(category.clone())
            .push(")");
    }
    if let Some(collection) = &filter.collection {
        builder
            .push(" AND p.collection_id = (SELECT id FROM collections WHERE slug = ")
            .push_bind(collection.clone())
            .push(")");
    }
    if let Some(tag) = &filter.tag {
        builder
            .push(
                " AND EXISTS (SELECT 1 FROM product_tags pt JOIN tags t ON t.id = pt.tag_id \
                 WHERE pt.product_id = p.id AND t.slug = ",
            )
            .push_bind(tag.clone())
            .push(")");
    }
    if let Some(q) = filter.query() {
        let pattern = like_pattern(q);
        builder
            .push(" AND (p.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.brand ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.sku ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(min) = filter.min_price {
        builder
            .push(" AND COALESCE(p.sale_price, p.price) >= ")
            .push_bind(min);
    }
    if let Some(max) = filter.max_price {
        builder
            .push(" AND COALESCE(p.sale_price, p.price) <= ")
            .push_bind(max);
    }
    match filter.in_stock {
        Some(true) => {
            builder.push(" AND p.stock > 0");
        }
        Some(false) => {
            builder.push(" AND p.stock = 0");
        }
        None => {}
    }
}

/// Repository for product reads.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List active products matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        params: &PageParams,
    ) -> Result<Page<ProductCard>, RepositoryError> {
        let mut count =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products p WHERE p.is_active");
        push_filters(&mut count, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(CARD_SELECT);
        query.push(" WHERE p.is_active");
        push_filters(&mut query, filter);
        query.push(filter.sort.order_by());
        query
            .push(" LIMIT ")
            .push_bind(params.limit())
            .push(" OFFSET ")
            .push_bind(params.offset());

        let rows = query.build_query_as::<ProductCardRow>().fetch_all(self.pool).await?;

        Ok(Page::new(
            rows.into_iter().map(ProductCard::from).collect(),
            params,
            total,
        ))
    }

    /// Featured active products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn featured(&self, limit: i64) -> Result<Vec<ProductCard>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductCardRow>(&format!(
            "{CARD_SELECT} WHERE p.is_active AND p.is_featured \
             ORDER BY p.created_at DESC, p.id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ProductCard::from).collect())
    }

    /// Most recently added active products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn newest(&self, limit: i64) -> Result<Vec<ProductCard>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new(CARD_SELECT);
        query.push(" WHERE p.is_active");
        query.push(ProductSort::Newest.order_by());
        query.push(" LIMIT ").push_bind(limit);

        let rows = query.build_query_as::<ProductCardRow>().fetch_all(self.pool).await?;
        Ok(rows.into_iter().map(ProductCard::from).collect())
    }

    /// Quick search over active products by name, brand and SKU.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(&self, q: &str, limit: i64) -> Result<Vec<ProductCard>, RepositoryError> {
        let pattern = like_pattern(q);
        let rows = sqlx::query_as::<_, ProductCardRow>(&format!(
            "{CARD_SELECT} WHERE p.is_active \
             AND (p.name ILIKE $1 OR p.brand ILIKE $1 OR p.sku ILIKE $1) \
             ORDER BY (p.name ILIKE $2) DESC, p.name ASC LIMIT $3"
        ))
        .bind(&pattern)
        .bind(format!("{}%", q.trim()))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ProductCard::from).collect())
    }

    /// Get an active product by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE slug = $1 AND is_active"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Images of a product in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn images(&self, product_id: ProductId) -> Result<Vec<ProductImage>, RepositoryError> {
        let images = sqlx::query_as::<_, ProductImage>(
            "SELECT id, product_id, url, alt, position FROM product_images \
             WHERE product_id = $1 ORDER BY position, id",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(images)
    }

    /// Attribute rows of a product in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn attributes(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductAttribute>, RepositoryError> {
        let attributes = sqlx::query_as::<_, ProductAttribute>(
            "SELECT id, product_id, name, value, position FROM product_attributes \
             WHERE product_id = $1 ORDER BY position, id",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(attributes)
    }

    /// Tags attached to a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn tags(&self, product_id: ProductId) -> Result<Vec<Tag>, RepositoryError> {
        let tags = sqlx::query_as::<_, Tag>(
            "SELECT t.id, t.name, t.slug FROM tags t \
             JOIN product_tags pt ON pt.tag_id = t.id \
             WHERE pt.product_id = $1 ORDER BY t.name",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(tags)
    }

    /// Approved review counts per star rating.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn rating_counts(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<(i16, i64)>, RepositoryError> {
        let counts = sqlx::query_as::<_, (i16, i64)>(
            "SELECT rating, COUNT(*) FROM reviews \
             WHERE product_id = $1 AND is_approved GROUP BY rating",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(counts)
    }

    /// Other active products from the same category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn related(
        &self,
        product_id: ProductId,
        category_id: Option<CategoryId>,
        limit: i64,
    ) -> Result<Vec<ProductCard>, RepositoryError> {
        let Some(category_id) = category_id else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query_as::<_, ProductCardRow>(&format!(
            "{CARD_SELECT} WHERE p.is_active AND p.category_id = $1 AND p.id <> $2 \
             ORDER BY (p.stock > 0) DESC, p.created_at DESC LIMIT $3"
        ))
        .bind(category_id)
        .bind(product_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ProductCard::from).collect())
    }

    /// Live pricing and stock for the given products, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn cart_products(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, CartProduct>, RepositoryError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();

        let rows = sqlx::query_as::<_, CartProduct>(
            "SELECT p.id, p.name, p.slug, p.price, p.sale_price, p.stock, p.is_active, \
                (SELECT i.url FROM product_images i WHERE i.product_id = p.id \
                    ORDER BY i.position, i.id LIMIT 1) AS image_url \
             FROM products p WHERE p.id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(|p| (p.id, p)).collect())
    }

    /// Live pricing and stock for a single product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn cart_product(&self, id: ProductId) -> Result<Option<CartProduct>, RepositoryError> {
        let mut products = self.cart_products(&[id]).await?;
        Ok(products.remove(&id))
    }
}

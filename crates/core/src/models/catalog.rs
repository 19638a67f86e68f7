//! Catalog rows: products and the taxonomies that group them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::{
    CategoryId, CollectionId, Price, ProductAttributeId, ProductId, ProductImageId, TagId,
    effective_price,
};

/// A product category such as "Lens cận" or "Phụ kiện".
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    /// Sort order in navigation (ascending).
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A curated collection, e.g. a seasonal line.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A free-form product tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub slug: String,
}

/// A sellable product.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub sku: Option<String>,
    pub brand: Option<String>,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub stock: i32,
    pub category_id: Option<CategoryId>,
    pub collection_id: Option<CollectionId>,
    pub is_active: bool,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Price the customer pays right now.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        effective_price(self.price, self.sale_price)
    }

    /// Whether the product is discounted.
    #[must_use]
    pub fn on_sale(&self) -> bool {
        self.effective_price() < self.price
    }

    /// Whether at least one unit is available.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Effective price formatted for display.
    #[must_use]
    pub fn display_price(&self) -> String {
        Price::new(self.effective_price()).format_vnd()
    }
}

/// A product photo.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct ProductImage {
    pub id: ProductImageId,
    pub product_id: ProductId,
    pub url: String,
    pub alt: Option<String>,
    pub position: i32,
}

/// A name/value attribute line, e.g. "Đường kính" / "14.2mm".
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct ProductAttribute {
    pub id: ProductAttributeId,
    pub product_id: ProductId,
    pub name: String,
    pub value: String,
    pub position: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price: i64, sale_price: Option<i64>, stock: i32) -> Product {
        Product {
            id: ProductId::new(1),
            name: "Lens Nâu Tây".to_string(),
            slug: "lens-nau-tay".to_string(),
            sku: None,
            brand: None,
            short_description: None,
            description: None,
            price: Decimal::from(price),
            sale_price: sale_price.map(Decimal::from),
            stock,
            category_id: None,
            collection_id: None,
            is_active: true,
            is_featured: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_effective_price_prefers_lower_sale() {
        let p = product(250_000, Some(199_000), 3);
        assert_eq!(p.effective_price(), Decimal::from(199_000));
        assert!(p.on_sale());
        assert_eq!(p.display_price(), "199.000 ₫");
    }

    #[test]
    fn test_effective_price_without_sale() {
        let p = product(250_000, None, 0);
        assert_eq!(p.effective_price(), Decimal::from(250_000));
        assert!(!p.on_sale());
        assert!(!p.in_stock());
    }
}

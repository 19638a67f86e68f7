//! Catalog response shapes.

use kilala_core::models::{Category, Collection, Product, ProductAttribute, ProductImage, Tag};
use kilala_core::{Price, ProductId, effective_price};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Listing sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
    BestSelling,
}

impl ProductSort {
    /// `ORDER BY` clause for this sort. Ties break on id for stable paging.
    #[must_use]
    pub const fn order_by(self) -> &'static str {
        match self {
            Self::Newest => " ORDER BY p.created_at DESC, p.id DESC",
            Self::PriceAsc => " ORDER BY COALESCE(p.sale_price, p.price) ASC, p.id ASC",
            Self::PriceDesc => " ORDER BY COALESCE(p.sale_price, p.price) DESC, p.id DESC",
            Self::Name => " ORDER BY p.name ASC, p.id ASC",
            Self::BestSelling => {
                " ORDER BY (SELECT COALESCE(SUM(oi.quantity), 0) FROM order_items oi \
                 JOIN orders o ON o.id = oi.order_id \
                 WHERE oi.product_id = p.id AND o.status <> 'cancelled') DESC, p.id DESC"
            }
        }
    }
}

/// Product listing filters parsed from the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    /// Category slug.
    pub category: Option<String>,
    /// Collection slug.
    pub collection: Option<String>,
    /// Tag slug.
    pub tag: Option<String>,
    /// Free-text search over name, brand and SKU.
    pub q: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub in_stock: Option<bool>,
    #[serde(default)]
    pub sort: ProductSort,
}

impl ProductFilter {
    /// Search text with surrounding whitespace removed, if any is left.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

/// Product card row as selected from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductCardRow {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub brand: Option<String>,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub stock: i32,
    pub image_url: Option<String>,
    pub avg_rating: Option<f64>,
    pub review_count: i64,
}

/// Product summary shown in listings, search results and the cart.
#[derive(Debug, Clone, Serialize)]
pub struct ProductCard {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub brand: Option<String>,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub effective_price: Decimal,
    pub display_price: String,
    pub image_url: Option<String>,
    pub stock: i32,
    pub in_stock: bool,
    pub avg_rating: Option<f64>,
    pub review_count: i64,
}

impl From<ProductCardRow> for ProductCard {
    fn from(row: ProductCardRow) -> Self {
        let effective = effective_price(row.price, row.sale_price);
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            brand: row.brand,
            price: row.price,
            sale_price: row.sale_price,
            effective_price: effective,
            display_price: Price::new(effective).format_vnd(),
            image_url: row.image_url,
            stock: row.stock,
            in_stock: row.stock > 0,
            avg_rating: row.avg_rating.map(|r| (r * 10.0).round() / 10.0),
            review_count: row.review_count,
        }
    }
}

/// Aggregate of approved reviews.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RatingSummary {
    pub average: Option<f64>,
    pub count: i64,
    /// Review counts for 1 through 5 stars (index 0 is one star).
    pub histogram: [i64; 5],
}

impl RatingSummary {
    /// Build from `(rating, count)` pairs.
    #[must_use]
    pub fn from_counts(counts: &[(i16, i64)]) -> Self {
        let mut histogram = [0_i64; 5];
        let mut total = 0_i64;
        let mut weighted = 0_i64;

        for &(rating, count) in counts {
            let Some(slot) = usize::try_from(rating - 1)
                .ok()
                .and_then(|i| histogram.get_mut(i))
            else {
                continue;
            };
            *slot += count;
            total += count;
            weighted += i64::from(rating) * count;
        }

        #[allow(clippy::cast_precision_loss)]
        let average = (total > 0).then(|| {
            let avg = weighted as f64 / total as f64;
            (avg * 10.0).round() / 10.0
        });

        Self {
            average,
            count: total,
            histogram,
        }
    }
}

/// Full product page.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub effective_price: Decimal,
    pub display_price: String,
    pub in_stock: bool,
    pub images: Vec<ProductImage>,
    pub attributes: Vec<ProductAttribute>,
    pub tags: Vec<Tag>,
    pub category: Option<Category>,
    pub collection: Option<Collection>,
    pub rating: RatingSummary,
    pub related: Vec<ProductCard>,
}

/// Navigation entry for categories, collections and tags.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct NavItem {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub image_url: Option<String>,
    pub product_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_summary_from_counts() {
        let summary = RatingSummary::from_counts(&[(5, 3), (4, 1), (1, 1)]);
        assert_eq!(summary.count, 5);
        assert_eq!(summary.histogram, [1, 0, 0, 1, 3]);
        assert_eq!(summary.average, Some(4.0));
    }

    #[test]
    fn test_rating_summary_empty() {
        let summary = RatingSummary::from_counts(&[]);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.average, None);
    }

    #[test]
    fn test_rating_summary_ignores_out_of_range() {
        let summary = RatingSummary::from_counts(&[(0, 4), (6, 2), (3, 2)]);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.histogram, [0, 0, 2, 0, 0]);
    }

    #[test]
    fn test_card_from_row() {
        let card = ProductCard::from(ProductCardRow {
            id: ProductId::new(3),
            name: "Lens Xám".to_string(),
            slug: "lens-xam".to_string(),
            brand: Some("Kilala".to_string()),
            price: Decimal::from(320_000),
            sale_price: Some(Decimal::from(280_000)),
            stock: 0,
            image_url: None,
            avg_rating: Some(4.666),
            review_count: 3,
        });
        assert_eq!(card.effective_price, Decimal::from(280_000));
        assert_eq!(card.display_price, "280.000 ₫");
        assert!(!card.in_stock);
        assert_eq!(card.avg_rating, Some(4.7));
    }

    #[test]
    fn test_filter_query_trims() {
        let filter = ProductFilter {
            q: Some("   ".to_string()),
            ..ProductFilter::default()
        };
        assert_eq!(filter.query(), None);
    }
}

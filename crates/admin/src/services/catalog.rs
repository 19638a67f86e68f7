//! Validation of catalog payloads: products, categories, collections, tags.

use std::collections::BTreeSet;

use kilala_core::{CategoryId, CollectionId, TagId, slug_or_derive};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Largest price a `NUMERIC(12, 0)` column holds.
const MAX_PRICE: i64 = 999_999_999_999;

/// Longest product or taxonomy name.
const MAX_NAME_LENGTH: usize = 200;

/// Per-field validation failures, in Vietnamese.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<(&'static str, &'static str)>);

impl ValidationErrors {
    /// All messages joined for a single error response.
    #[must_use]
    pub fn message(&self) -> String {
        self.0
            .iter()
            .map(|(_, msg)| *msg)
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Whether a given field failed.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|(f, _)| *f == field)
    }

    fn push(&mut self, field: &'static str, message: &'static str) {
        self.0.push((field, message));
    }

    fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.0.is_empty() { Ok(value) } else { Err(self) }
    }
}

/// Trim an optional text field, treating blank as absent.
pub(crate) fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn default_true() -> bool {
    true
}

/// A product attribute row, e.g. `Độ cận` / `-2.00`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AttributeInput {
    pub name: String,
    pub value: String,
}

/// Product create/update payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub slug: Option<String>,
    pub sku: Option<String>,
    pub brand: Option<String>,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    #[serde(default)]
    pub stock: i32,
    pub category_id: Option<CategoryId>,
    pub collection_id: Option<CollectionId>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub attributes: Vec<AttributeInput>,
    #[serde(default)]
    pub tag_ids: Vec<TagId>,
}

/// A product payload that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidProduct {
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
    /// Attributes in display order; blank rows removed.
    pub attributes: Vec<AttributeInput>,
    /// Distinct tag ids.
    pub tag_ids: Vec<TagId>,
}

impl ProductInput {
    /// Validate and normalize the payload, collecting every failure.
    ///
    /// # Errors
    ///
    /// Returns the failing fields with their messages.
    pub fn validate(self) -> Result<ValidProduct, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let name = self.name.trim().to_string();
        if name.is_empty() {
            errors.push("name", "Vui lòng nhập tên sản phẩm");
        } else if name.chars().count() > MAX_NAME_LENGTH {
            errors.push("name", "Tên sản phẩm quá dài");
        }

        let slug = slug_or_derive(self.slug.as_deref(), &name).unwrap_or_else(|_| {
            errors.push("slug", "Slug không hợp lệ");
            String::new()
        });

        let max_price = Decimal::from(MAX_PRICE);
        let price = self.price.round();
        if price <= Decimal::ZERO || price > max_price {
            errors.push("price", "Giá phải lớn hơn 0");
        }

        let sale_price = self.sale_price.map(|p| p.round());
        if let Some(sale) = sale_price
            && (sale <= Decimal::ZERO || sale >= price)
        {
            errors.push("sale_price", "Giá khuyến mãi phải nhỏ hơn giá gốc");
        }

        if self.stock < 0 {
            errors.push("stock", "Tồn kho không được âm");
        }

        let mut attributes = Vec::with_capacity(self.attributes.len());
        for attr in self.attributes {
            let attr = AttributeInput {
                name: attr.name.trim().to_string(),
                value: attr.value.trim().to_string(),
            };
            match (attr.name.is_empty(), attr.value.is_empty()) {
                (true, true) => {}
                (false, false) => attributes.push(attr),
                _ => {
                    errors.push("attributes", "Thuộc tính cần có cả tên và giá trị");
                    break;
                }
            }
        }

        let mut seen = BTreeSet::new();
        let tag_ids = self
            .tag_ids
            .into_iter()
            .filter(|id| seen.insert(*id))
            .collect();

        errors.into_result(ValidProduct {
            name,
            slug,
            sku: clean(self.sku),
            brand: clean(self.brand),
            short_description: clean(self.short_description),
            description: clean(self.description),
            price,
            sale_price,
            stock: self.stock,
            category_id: self.category_id,
            collection_id: self.collection_id,
            is_active: self.is_active,
            is_featured: self.is_featured,
            attributes,
            tag_ids,
        })
    }
}

/// Category, collection or tag payload.
///
/// Tags ignore `description`, `image_url` and `position`; collections ignore
/// `position`.
#[derive(Debug, Clone, Deserialize)]
pub struct TaxonomyInput {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub position: Option<i32>,
}

/// A taxonomy payload that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidTaxonomy {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub position: i32,
}

impl TaxonomyInput {
    /// Validate and normalize the payload.
    ///
    /// # Errors
    ///
    /// Returns the failing fields with their messages.
    pub fn validate(self) -> Result<ValidTaxonomy, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let name = self.name.trim().to_string();
        if name.is_empty() {
            errors.push("name", "Vui lòng nhập tên");
        } else if name.chars().count() > MAX_NAME_LENGTH {
            errors.push("name", "Tên quá dài");
        }

        let slug = slug_or_derive(self.slug.as_deref(), &name).unwrap_or_else(|_| {
            errors.push("slug", "Slug không hợp lệ");
            String::new()
        });

        errors.into_result(ValidTaxonomy {
            name,
            slug,
            description: clean(self.description),
            image_url: clean(self.image_url),
            position: self.position.unwrap_or(0),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product() -> ProductInput {
        ProductInput {
            name: "  Lens Xám Tây 14.2mm ".to_string(),
            slug: None,
            sku: Some(" KL-GRY-142 ".to_string()),
            brand: Some(String::new()),
            short_description: None,
            description: None,
            price: Decimal::from(250_000),
            sale_price: Some(Decimal::from(199_000)),
            stock: 20,
            category_id: Some(CategoryId::new(1)),
            collection_id: None,
            is_active: true,
            is_featured: false,
            attributes: vec![
                AttributeInput {
                    name: "Độ cận".to_string(),
                    value: " -2.00 ".to_string(),
                },
                AttributeInput {
                    name: " ".to_string(),
                    value: String::new(),
                },
            ],
            tag_ids: vec![TagId::new(3), TagId::new(1), TagId::new(3)],
        }
    }

    #[test]
    fn test_product_normalizes() {
        let valid = product().validate().unwrap();
        assert_eq!(valid.name, "Lens Xám Tây 14.2mm");
        assert_eq!(valid.slug, "lens-xam-tay-14-2mm");
        assert_eq!(valid.sku.as_deref(), Some("KL-GRY-142"));
        assert_eq!(valid.brand, None);
        assert_eq!(valid.attributes.len(), 1);
        assert_eq!(valid.attributes[0].value, "-2.00");
        assert_eq!(valid.tag_ids, vec![TagId::new(3), TagId::new(1)]);
    }

    #[test]
    fn test_product_explicit_slug_is_normalized() {
        let mut input = product();
        input.slug = Some("Kính Áp Tròng".to_string());
        assert_eq!(input.validate().unwrap().slug, "kinh-ap-trong");
    }

    #[test]
    fn test_product_price_rules() {
        let mut input = product();
        input.price = Decimal::ZERO;
        input.sale_price = None;
        assert!(input.validate().unwrap_err().has("price"));

        let mut input = product();
        input.sale_price = Some(Decimal::from(250_000));
        assert!(input.validate().unwrap_err().has("sale_price"));
    }

    #[test]
    fn test_product_collects_all_errors() {
        let mut input = product();
        input.name = "   ".to_string();
        input.stock = -1;
        input.attributes = vec![AttributeInput {
            name: "Màu".to_string(),
            value: String::new(),
        }];

        let errors = input.validate().unwrap_err();
        assert!(errors.has("name"));
        assert!(errors.has("slug"));
        assert!(errors.has("stock"));
        assert!(errors.has("attributes"));
        assert!(errors.message().contains("Tồn kho không được âm"));
    }

    #[test]
    fn test_taxonomy_defaults() {
        let valid = TaxonomyInput {
            name: "Lens Cận".to_string(),
            slug: Some("  ".to_string()),
            description: Some("  ".to_string()),
            image_url: None,
            position: None,
        }
        .validate()
        .unwrap();

        assert_eq!(valid.slug, "lens-can");
        assert_eq!(valid.description, None);
        assert_eq!(valid.position, 0);
    }

    #[test]
    fn test_taxonomy_requires_name() {
        let errors = TaxonomyInput {
            name: String::new(),
            slug: None,
            description: None,
            image_url: None,
            position: None,
        }
        .validate()
        .unwrap_err();
        assert!(errors.has("name"));
    }

    #[test]
    fn test_product_payload_deserializes_with_defaults() {
        let input: ProductInput =
            serde_json::from_str(r#"{"name": "Lens A", "price": "150000"}"#).unwrap();
        assert!(input.is_active);
        assert!(!input.is_featured);
        assert_eq!(input.stock, 0);
        assert!(input.attributes.is_empty());
    }
}

//! Seed the catalog from a YAML file.
//!
//! Categories, collections, tags and products are upserted by slug, so the
//! command can be re-run after editing the file. Slugs left out are derived
//! from the name the same way the admin does it. Products reference
//! taxonomy by slug; the referenced row may come from the same file or
//! already exist in the database.
//!
//! A product's attributes and tags are replaced on every run. Its images are
//! replaced only when the file lists some, so images uploaded through the
//! admin survive a re-seed of an image-less entry.
//!
//! See `seed/catalog.yaml` for the format.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use kilala_admin::db::{
    CategoryRepository, CollectionRepository, ImageRepository, ProductRepository,
    RepositoryError, TagRepository,
};
use kilala_admin::services::catalog::{ProductInput, TaxonomyInput, ValidProduct, ValidTaxonomy};
use kilala_core::{CategoryId, CollectionId, ProductId, TagId};
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{error, info};

use super::{DATABASE_URL_VAR, connect, database_url};

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// The file could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    /// The file is not valid YAML for the catalog format.
    #[error("Invalid catalog file: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// One or more entries failed validation (details are logged).
    #[error("{0} validation errors found")]
    Invalid(usize),

    /// A product names a category, collection or tag that does not exist.
    #[error("Product {product}: unknown {kind} '{slug}'")]
    UnknownReference {
        product: String,
        kind: &'static str,
        slug: String,
    },

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A write was rejected.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Top-level layout of the catalog file.
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub categories: Vec<TaxonomyInput>,
    #[serde(default)]
    pub collections: Vec<TaxonomyInput>,
    #[serde(default)]
    pub tags: Vec<TaxonomyInput>,
    #[serde(default)]
    pub products: Vec<SeedProductInput>,
}

/// A product entry: the admin payload plus slug references and image URLs.
#[derive(Debug, Deserialize)]
pub struct SeedProductInput {
    #[serde(flatten)]
    pub product: ProductInput,
    /// Category slug.
    pub category: Option<String>,
    /// Collection slug.
    pub collection: Option<String>,
    /// Tag slugs.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Image URLs in display order.
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug)]
struct SeedProduct {
    product: ValidProduct,
    category: Option<String>,
    collection: Option<String>,
    tags: Vec<String>,
    images: Vec<String>,
}

#[derive(Debug)]
struct ValidCatalog {
    categories: Vec<ValidTaxonomy>,
    collections: Vec<ValidTaxonomy>,
    tags: Vec<ValidTaxonomy>,
    products: Vec<SeedProduct>,
}

/// Counts reported at the end of a run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub collections: usize,
    pub tags: usize,
    pub products_created: usize,
    pub products_updated: usize,
}

fn validate_taxonomy(
    kind: &str,
    inputs: Vec<TaxonomyInput>,
    errors: &mut Vec<String>,
) -> Vec<ValidTaxonomy> {
    let mut seen = HashSet::new();
    let mut valid = Vec::with_capacity(inputs.len());

    for (i, input) in inputs.into_iter().enumerate() {
        let label = format!("{kind} #{} ({})", i + 1, input.name.trim());
        match input.validate() {
            Ok(item) if !seen.insert(item.slug.clone()) => {
                errors.push(format!("{label}: duplicate slug '{}'", item.slug));
            }
            Ok(item) => valid.push(item),
            Err(e) => errors.push(format!("{label}: {}", e.message())),
        }
    }
    valid
}

fn clean_refs(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty() && seen.insert(v.clone()))
        .collect()
}

/// Validate every entry, collecting all failures.
fn validate(file: CatalogFile) -> Result<ValidCatalog, Vec<String>> {
    let mut errors = Vec::new();

    let categories = validate_taxonomy("category", file.categories, &mut errors);
    let collections = validate_taxonomy("collection", file.collections, &mut errors);
    let tags = validate_taxonomy("tag", file.tags, &mut errors);

    let mut seen = HashSet::new();
    let mut products = Vec::with_capacity(file.products.len());
    for (i, input) in file.products.into_iter().enumerate() {
        let label = format!("product #{} ({})", i + 1, input.product.name.trim());
        match input.product.validate() {
            Ok(product) if !seen.insert(product.slug.clone()) => {
                errors.push(format!("{label}: duplicate slug '{}'", product.slug));
            }
            Ok(product) => products.push(SeedProduct {
                product,
                category: input.category.map(|s| s.trim().to_owned()),
                collection: input.collection.map(|s| s.trim().to_owned()),
                tags: clean_refs(input.tags),
                images: clean_refs(input.images),
            }),
            Err(e) => errors.push(format!("{label}: {}", e.message())),
        }
    }

    if errors.is_empty() {
        Ok(ValidCatalog {
            categories,
            collections,
            tags,
            products,
        })
    } else {
        Err(errors)
    }
}

/// Seed the catalog from a YAML file.
///
/// The whole file is validated before connecting to the database.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails validation, a
/// reference is unknown, or a database write fails.
pub async fn catalog(file_path: &str) -> Result<SeedSummary, SeedError> {
    info!(path = %file_path, "Loading catalog from file");

    let content = tokio::fs::read_to_string(Path::new(file_path))
        .await
        .map_err(|source| SeedError::Read {
            path: file_path.to_owned(),
            source,
        })?;
    let file: CatalogFile = serde_yaml::from_str(&content)?;

    let catalog = validate(file).map_err(|errors| {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        SeedError::Invalid(errors.len())
    })?;

    info!(
        categories = catalog.categories.len(),
        collections = catalog.collections.len(),
        tags = catalog.tags.len(),
        products = catalog.products.len(),
        "Catalog validated successfully"
    );

    let database_url = database_url().ok_or(SeedError::MissingEnvVar(DATABASE_URL_VAR))?;
    let pool = connect(&database_url).await?;

    let summary = Seeder::new(&pool).run(catalog).await?;

    info!("Seeding complete!");
    info!("  Categories: {}", summary.categories);
    info!("  Collections: {}", summary.collections);
    info!("  Tags: {}", summary.tags);
    info!(
        "  Products: {} created, {} updated",
        summary.products_created, summary.products_updated
    );

    Ok(summary)
}

/// Writes a validated catalog, remembering the ids of upserted taxonomy.
struct Seeder<'a> {
    pool: &'a PgPool,
    categories: HashMap<String, CategoryId>,
    collections: HashMap<String, CollectionId>,
    tags: HashMap<String, TagId>,
}

impl<'a> Seeder<'a> {
    fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            categories: HashMap::new(),
            collections: HashMap::new(),
            tags: HashMap::new(),
        }
    }

    async fn run(mut self, catalog: ValidCatalog) -> Result<SeedSummary, SeedError> {
        let mut summary = SeedSummary::default();

        let repo = CategoryRepository::new(self.pool);
        for input in &catalog.categories {
            let category = match find_id(self.pool, "categories", &input.slug).await? {
                Some(id) => repo.update(id, input).await?,
                None => repo.create(input).await?,
            };
            self.categories.insert(category.slug, category.id);
            summary.categories += 1;
        }

        let repo = CollectionRepository::new(self.pool);
        for input in &catalog.collections {
            let collection = match find_id(self.pool, "collections", &input.slug).await? {
                Some(id) => repo.update(id, input).await?,
                None => repo.create(input).await?,
            };
            self.collections.insert(collection.slug, collection.id);
            summary.collections += 1;
        }

        let repo = TagRepository::new(self.pool);
        for input in &catalog.tags {
            let tag = match find_id(self.pool, "tags", &input.slug).await? {
                Some(id) => repo.update(id, input).await?,
                None => repo.create(input).await?,
            };
            self.tags.insert(tag.slug, tag.id);
            summary.tags += 1;
        }

        for item in catalog.products {
            let created = self.upsert_product(item).await?;
            if created {
                summary.products_created += 1;
            } else {
                summary.products_updated += 1;
            }
        }

        Ok(summary)
    }

    /// Upsert one product; returns whether it was new.
    async fn upsert_product(&mut self, item: SeedProduct) -> Result<bool, SeedError> {
        let SeedProduct {
            mut product,
            category,
            collection,
            tags,
            images,
        } = item;

        product.category_id = match category {
            Some(slug) => Some(self.category_id(&product.slug, slug).await?),
            None => None,
        };
        product.collection_id = match collection {
            Some(slug) => Some(self.collection_id(&product.slug, slug).await?),
            None => None,
        };
        let mut tag_ids = Vec::with_capacity(tags.len());
        for slug in tags {
            tag_ids.push(self.tag_id(&product.slug, slug).await?);
        }
        product.tag_ids = tag_ids;

        let repo = ProductRepository::new(self.pool);
        let existing: Option<ProductId> = find_id(self.pool, "products", &product.slug).await?;
        let detail = match existing {
            Some(id) => repo.update(id, &product).await?,
            None => repo.create(&product).await?,
        };
        let product_id = detail.product.id;

        if !images.is_empty() {
            sqlx::query("DELETE FROM product_images WHERE product_id = $1")
                .bind(product_id)
                .execute(self.pool)
                .await?;
            ImageRepository::new(self.pool)
                .append(product_id, &images, Some(product.name.as_str()))
                .await?;
        }

        Ok(existing.is_none())
    }

    async fn category_id(&mut self, product: &str, slug: String) -> Result<CategoryId, SeedError> {
        if let Some(id) = self.categories.get(&slug) {
            return Ok(*id);
        }
        let id = find_id(self.pool, "categories", &slug)
            .await?
            .ok_or_else(|| unknown(product, "category", &slug))?;
        self.categories.insert(slug, id);
        Ok(id)
    }

    async fn collection_id(
        &mut self,
        product: &str,
        slug: String,
    ) -> Result<CollectionId, SeedError> {
        if let Some(id) = self.collections.get(&slug) {
            return Ok(*id);
        }
        let id = find_id(self.pool, "collections", &slug)
            .await?
            .ok_or_else(|| unknown(product, "collection", &slug))?;
        self.collections.insert(slug, id);
        Ok(id)
    }

    async fn tag_id(&mut self, product: &str, slug: String) -> Result<TagId, SeedError> {
        if let Some(id) = self.tags.get(&slug) {
            return Ok(*id);
        }
        let id = find_id(self.pool, "tags", &slug)
            .await?
            .ok_or_else(|| unknown(product, "tag", &slug))?;
        self.tags.insert(slug, id);
        Ok(id)
    }
}

fn unknown(product: &str, kind: &'static str, slug: &str) -> SeedError {
    SeedError::UnknownReference {
        product: product.to_owned(),
        kind,
        slug: slug.to_owned(),
    }
}

/// Look up a row id by slug. `table` is always one of our literals.
async fn find_id<T>(pool: &PgPool, table: &'static str, slug: &str) -> Result<Option<T>, sqlx::Error>
where
    T: for<'r> sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres> + Send + Unpin,
{
    sqlx::query_scalar::<_, T>(&format!("SELECT id FROM {table} WHERE slug = $1"))
        .bind(slug)
        .fetch_optional(pool)
        .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    const SAMPLE: &str = include_str!("../../../../seed/catalog.yaml");

    fn parse(yaml: &str) -> CatalogFile {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_sample_catalog_is_valid() {
        let catalog = validate(parse(SAMPLE)).unwrap();

        assert!(!catalog.categories.is_empty());
        assert!(!catalog.products.is_empty());

        let category_slugs: HashSet<_> = catalog.categories.iter().map(|c| &c.slug).collect();
        let tag_slugs: HashSet<_> = catalog.tags.iter().map(|t| &t.slug).collect();
        for item in &catalog.products {
            if let Some(category) = &item.category {
                assert!(category_slugs.contains(category), "{category}");
            }
            for tag in &item.tags {
                assert!(tag_slugs.contains(tag), "{tag}");
            }
        }
    }

    #[test]
    fn test_product_entry_fields() {
        let yaml = r"
products:
  - name: Lens Xám Tây 14.2mm
    sku: KL-GRY-142
    price: 250000
    sale_price: 199000
    stock: 20
    category: lens-can
    tags: [tu-nhien, ' tu-nhien ', '']
    images: [/uploads/gray-1.jpg]
    attributes:
      - name: Đường kính
        value: 14.2mm
";
        let catalog = validate(parse(yaml)).unwrap();
        let item = catalog.products.first().unwrap();

        assert_eq!(item.product.slug, "lens-xam-tay-14-2mm");
        assert_eq!(item.product.price, Decimal::from(250_000));
        assert_eq!(item.product.sale_price, Some(Decimal::from(199_000)));
        assert!(item.product.is_active);
        assert_eq!(item.category.as_deref(), Some("lens-can"));
        assert_eq!(item.tags, vec!["tu-nhien"]);
        assert_eq!(item.images, vec!["/uploads/gray-1.jpg"]);
        assert_eq!(item.product.attributes.len(), 1);
    }

    #[test]
    fn test_validation_collects_every_error() {
        let yaml = r"
categories:
  - name: Lens cận
  - name: Lens Cận
tags:
  - name: '!!!'
products:
  - name: Lens A
    price: 0
  - name: Lens B
    price: 100000
    sale_price: 150000
";
        let errors = validate(parse(yaml)).unwrap_err();

        assert_eq!(errors.len(), 4, "{errors:?}");
        assert!(errors.iter().any(|e| e.starts_with("category #2") && e.contains("lens-can")));
        assert!(errors.iter().any(|e| e.starts_with("tag #1")));
        assert!(errors.iter().any(|e| e.starts_with("product #1 (Lens A)")));
        assert!(errors.iter().any(|e| e.starts_with("product #2 (Lens B)")));
    }

    #[test]
    fn test_duplicate_product_slug() {
        let yaml = r"
products:
  - name: Lens A
    price: 100000
  - name: Khác
    slug: lens-a
    price: 100000
";
        let errors = validate(parse(yaml)).unwrap_err();
        assert_eq!(errors, vec!["product #2 (Khác): duplicate slug 'lens-a'"]);
    }

    #[test]
    fn test_empty_file_sections_default() {
        let catalog = validate(parse("categories: []\n")).unwrap();
        assert!(catalog.products.is_empty());
        assert!(catalog.tags.is_empty());
    }
}

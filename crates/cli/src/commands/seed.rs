//! Seed the catalog from a YAML file.
//!
//! # Usage
//!
//! ```bash
//! hexshop seed                       # uses seed/catalog.yaml
//! hexshop seed --file my-catalog.yaml
//! ```
//!
//! # File Format
//!
//! ```yaml
//! categories:
//!   - name: Tools
//!     products:
//!       - name: Claw hammer
//!         shortDescription: 16 oz steel hammer
//!         price: "24.90"
//!         quantity: 40
//! ```
//!
//! Categories are matched by name and products by name within their category,
//! so running the command twice does not duplicate anything. Existing products
//! are left untouched.

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use hexshop_api::db::Stores;
use hexshop_api::models::ProductInput;
use hexshop_api::services::{CategoryService, ProductService};

use super::{CommandError, connect};

/// Top-level seed document.
#[derive(Debug, Deserialize)]
pub struct SeedCatalog {
    pub categories: Vec<SeedCategory>,
}

#[derive(Debug, Deserialize)]
pub struct SeedCategory {
    pub name: String,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedProduct {
    pub name: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub quantity: i32,
}

impl SeedCatalog {
    /// Parse a seed document.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::SeedFormat` if the YAML doesn't match.
    pub fn from_yaml(content: &str) -> Result<Self, CommandError> {
        Ok(serde_yaml::from_str(content)?)
    }
}

/// Counts of what a seed run did.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub categories_created: usize,
    pub products_created: usize,
    pub products_skipped: usize,
}

/// Insert whatever part of `catalog` is missing.
///
/// # Errors
///
/// Returns `CommandError::Catalog` if validation or a store call fails.
pub async fn apply(
    catalog: SeedCatalog,
    categories: &CategoryService,
    products: &ProductService,
) -> Result<SeedReport, CommandError> {
    let mut report = SeedReport::default();
    let mut existing_categories = categories.list().await?;
    let existing_products = products.list().await?;

    for seed_category in catalog.categories {
        let category = match existing_categories
            .iter()
            .find(|c| c.name == seed_category.name.trim())
        {
            Some(category) => category.clone(),
            None => {
                let created = categories.create(&seed_category.name).await?;
                report.categories_created += 1;
                existing_categories.push(created.clone());
                created
            }
        };

        for seed_product in seed_category.products {
            let exists = existing_products
                .iter()
                .any(|p| p.category_id == category.id && p.name == seed_product.name.trim());
            if exists {
                report.products_skipped += 1;
                continue;
            }

            products
                .create(ProductInput {
                    name: seed_product.name,
                    short_description: seed_product.short_description,
                    description: seed_product.description,
                    price: seed_product.price,
                    quantity: seed_product.quantity,
                    category_id: category.id,
                })
                .await?;
            report.products_created += 1;
        }
    }

    Ok(report)
}

/// Seed the database from `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, the database is
/// unreachable, or a catalog entry is invalid.
pub async fn run(file_path: &str) -> Result<(), CommandError> {
    let path = Path::new(file_path);
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CommandError::ReadFile {
            path: file_path.to_owned(),
            source,
        })?;

    info!(path = %file_path, "Loading catalog seed");
    let catalog = SeedCatalog::from_yaml(&content)?;
    info!(categories = catalog.categories.len(), "Parsed seed file");

    let pool = connect().await?;
    let stores = Stores::postgres(&pool);
    let categories = CategoryService::new(stores.categories.clone());
    let products = ProductService::new(stores.products, stores.categories);

    let report = apply(catalog, &categories, &products).await?;

    info!("Seeding complete!");
    info!("  Categories created: {}", report.categories_created);
    info!("  Products created: {}", report.products_created);
    info!("  Products skipped (already exist): {}", report.products_skipped);

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use hexshop_api::db::MemoryStore;

    use super::*;

    const BUNDLED: &str = include_str!("../../../../seed/catalog.yaml");

    fn services() -> (CategoryService, ProductService) {
        let store = Arc::new(MemoryStore::new());
        (
            CategoryService::new(store.clone()),
            ProductService::new(store.clone(), store),
        )
    }

    #[test]
    fn test_bundled_seed_parses() {
        let catalog = SeedCatalog::from_yaml(BUNDLED).unwrap();
        assert!(!catalog.categories.is_empty());
        assert!(catalog.categories.iter().all(|c| !c.products.is_empty()));
    }

    #[test]
    fn test_rejects_malformed_seed() {
        let result = SeedCatalog::from_yaml("categories:\n  - products: []\n");
        assert!(matches!(result, Err(CommandError::SeedFormat(_))));
    }

    #[tokio::test]
    async fn test_apply_is_idempotent() {
        let (categories, products) = services();

        let first = apply(
            SeedCatalog::from_yaml(BUNDLED).unwrap(),
            &categories,
            &products,
        )
        .await
        .unwrap();
        assert!(first.categories_created > 0);
        assert!(first.products_created > 0);
        assert_eq!(first.products_skipped, 0);

        let second = apply(
            SeedCatalog::from_yaml(BUNDLED).unwrap(),
            &categories,
            &products,
        )
        .await
        .unwrap();
        assert_eq!(second.categories_created, 0);
        assert_eq!(second.products_created, 0);
        assert_eq!(second.products_skipped, first.products_created);
    }

    #[tokio::test]
    async fn test_apply_rejects_negative_stock() {
        let (categories, products) = services();
        let catalog = SeedCatalog::from_yaml(
            "categories:\n  - name: Bad\n    products:\n      - name: Broken\n        price: \"1.00\"\n        quantity: -1\n",
        )
        .unwrap();

        let err = apply(catalog, &categories, &products).await.unwrap_err();
        assert!(matches!(err, CommandError::Catalog(_)));
    }
}

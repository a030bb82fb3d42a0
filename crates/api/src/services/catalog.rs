//! Category and product management.

use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::instrument;

use hexshop_core::{CategoryId, ProductId};

use crate::db::RepositoryError;
use crate::models::{Category, Product, ProductInput};
use crate::ports::{CategoryStore, ProductStore};

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Input failed validation.
    #[error("{0}")]
    Validation(String),

    /// The change would break a reference (e.g. deleting a category in use).
    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for CatalogError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Repository(other),
        }
    }
}

fn require_name(name: &str) -> Result<String, CatalogError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CatalogError::Validation("name must not be empty".to_owned()));
    }
    Ok(name.to_owned())
}

/// Category use cases.
#[derive(Clone)]
pub struct CategoryService {
    categories: Arc<dyn CategoryStore>,
}

impl CategoryService {
    #[must_use]
    pub fn new(categories: Arc<dyn CategoryStore>) -> Self {
        Self { categories }
    }

    /// All categories ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the store fails.
    pub async fn list(&self) -> Result<Vec<Category>, CatalogError> {
        Ok(self.categories.list_categories().await?)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the category doesn't exist.
    pub async fn find(&self, id: CategoryId) -> Result<Category, CatalogError> {
        self.categories
            .find_category_by_id(id)
            .await?
            .ok_or(CatalogError::NotFound("category"))
    }

    /// Create a category and return it.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` if the name is blank.
    #[instrument(skip(self))]
    pub async fn create(&self, name: &str) -> Result<Category, CatalogError> {
        let name = require_name(name)?;
        let id = self.categories.insert_category(&name).await?;
        tracing::info!(category_id = %id, "category created");
        self.find(id).await
    }

    /// Rename a category.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` if the name is blank, or
    /// `CatalogError::NotFound` if the category doesn't exist.
    #[instrument(skip(self))]
    pub async fn update(&self, id: CategoryId, name: &str) -> Result<Category, CatalogError> {
        let name = require_name(name)?;
        if self.categories.update_category(id, &name).await? == 0 {
            return Err(CatalogError::NotFound("category"));
        }
        self.find(id).await
    }

    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the category doesn't exist, or
    /// `CatalogError::Conflict` while products still reference it.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: CategoryId) -> Result<(), CatalogError> {
        if self.categories.delete_category(id).await? == 0 {
            return Err(CatalogError::NotFound("category"));
        }
        Ok(())
    }
}

/// Product use cases.
#[derive(Clone)]
pub struct ProductService {
    products: Arc<dyn ProductStore>,
    categories: Arc<dyn CategoryStore>,
}

impl ProductService {
    #[must_use]
    pub fn new(products: Arc<dyn ProductStore>, categories: Arc<dyn CategoryStore>) -> Self {
        Self {
            products,
            categories,
        }
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the store fails.
    pub async fn list(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.products.list_products().await?)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the product doesn't exist.
    pub async fn find(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.products
            .find_product_by_id(id)
            .await?
            .ok_or(CatalogError::NotFound("product"))
    }

    /// Create a product and return it.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` for a blank name, negative price or
    /// quantity, or a category that doesn't exist.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, mut input: ProductInput) -> Result<Product, CatalogError> {
        self.validate(&mut input).await?;
        let id = self.products.insert_product(&input).await?;
        tracing::info!(product_id = %id, "product created");
        self.find(id).await
    }

    /// Replace every writable field of a product.
    ///
    /// # Errors
    ///
    /// Same validation as [`Self::create`], plus `CatalogError::NotFound` if
    /// the product doesn't exist.
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: ProductId,
        mut input: ProductInput,
    ) -> Result<Product, CatalogError> {
        self.validate(&mut input).await?;
        let mut product = self.find(id).await?;
        product.apply(input);

        if self.products.update_product(&product, id).await? == 0 {
            return Err(CatalogError::NotFound("product"));
        }
        self.find(id).await
    }

    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the product doesn't exist.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> Result<(), CatalogError> {
        if self.products.delete_product(id).await? == 0 {
            return Err(CatalogError::NotFound("product"));
        }
        Ok(())
    }

    async fn validate(&self, input: &mut ProductInput) -> Result<(), CatalogError> {
        input.name = require_name(&input.name)?;
        if input.quantity < 0 {
            return Err(CatalogError::Validation(
                "quantity must not be negative".to_owned(),
            ));
        }
        if input.price < Decimal::ZERO {
            return Err(CatalogError::Validation(
                "price must not be negative".to_owned(),
            ));
        }
        if self
            .categories
            .find_category_by_id(input.category_id)
            .await?
            .is_none()
        {
            return Err(CatalogError::Validation(format!(
                "category {} does not exist",
                input.category_id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn services() -> (CategoryService, ProductService) {
        let store = Arc::new(MemoryStore::new());
        (
            CategoryService::new(store.clone()),
            ProductService::new(store.clone(), store),
        )
    }

    fn input(category_id: CategoryId) -> ProductInput {
        ProductInput {
            name: "Lamp".to_owned(),
            short_description: "Desk lamp".to_owned(),
            description: String::new(),
            price: Decimal::new(4500, 2),
            quantity: 12,
            category_id,
        }
    }

    #[tokio::test]
    async fn test_category_crud() {
        let (categories, _) = services();

        let created = categories.create("  Lighting ").await.unwrap();
        assert_eq!(created.name, "Lighting");

        let renamed = categories.update(created.id, "Lights").await.unwrap();
        assert_eq!(renamed.name, "Lights");
        assert_eq!(categories.list().await.unwrap().len(), 1);

        categories.delete(created.id).await.unwrap();
        assert!(matches!(
            categories.find(created.id).await,
            Err(CatalogError::NotFound("category"))
        ));
    }

    #[tokio::test]
    async fn test_category_name_required() {
        let (categories, _) = services();
        assert!(matches!(
            categories.create("").await,
            Err(CatalogError::Validation(_))
        ));

        let created = categories.create("Garden").await.unwrap();
        assert!(matches!(
            categories.update(created.id, " ").await,
            Err(CatalogError::Validation(_))
        ));
        assert!(matches!(
            categories.update(CategoryId::new(99), "Other").await,
            Err(CatalogError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_category_in_use_conflicts() {
        let (categories, products) = services();
        let category = categories.create("Lighting").await.unwrap();
        products.create(input(category.id)).await.unwrap();

        assert!(matches!(
            categories.delete(category.id).await,
            Err(CatalogError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_product_crud() {
        let (categories, products) = services();
        let category = categories.create("Lighting").await.unwrap();

        let created = products.create(input(category.id)).await.unwrap();
        assert_eq!(created.quantity, 12);
        assert_eq!(created.price, Decimal::new(4500, 2));

        let mut changed = input(category.id);
        changed.quantity = 3;
        changed.name = "Floor lamp".to_owned();
        let updated = products.update(created.id, changed).await.unwrap();
        assert_eq!(updated.quantity, 3);
        assert_eq!(updated.name, "Floor lamp");

        products.delete(created.id).await.unwrap();
        assert!(matches!(
            products.delete(created.id).await,
            Err(CatalogError::NotFound("product"))
        ));
    }

    #[tokio::test]
    async fn test_product_validation() {
        let (categories, products) = services();
        let category = categories.create("Lighting").await.unwrap();

        let mut negative = input(category.id);
        negative.quantity = -1;
        assert!(matches!(
            products.create(negative).await,
            Err(CatalogError::Validation(_))
        ));

        let mut free = input(category.id);
        free.price = Decimal::new(-1, 0);
        assert!(matches!(
            products.create(free).await,
            Err(CatalogError::Validation(_))
        ));

        assert!(matches!(
            products.create(input(CategoryId::new(42))).await,
            Err(CatalogError::Validation(_))
        ));

        assert!(matches!(
            products.update(ProductId::new(7), input(category.id)).await,
            Err(CatalogError::NotFound("product"))
        ));
    }
}

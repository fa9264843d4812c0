//! Product catalog.

use chrono::Utc;
use uuid::Uuid;

use stepup_core::{Money, ProductId};

use super::ServiceError;
use crate::db::Store;
use crate::models::{Product, ProductInput};

/// Catalog reads are public; writes are admin-only at the route layer.
pub struct CatalogService<'a> {
    store: &'a dyn Store,
}

/// Validated, trimmed product fields.
struct ProductFields {
    code: Option<String>,
    name: String,
    description: String,
    brand: String,
    category: String,
    color: String,
    price: Money,
    stock: i32,
    image_url: Option<String>,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn list(&self) -> Result<Vec<Product>, ServiceError> {
        Ok(self.store.list_products().await?)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if no product has this id.
    pub async fn get(&self, id: ProductId) -> Result<Product, ServiceError> {
        self.store
            .product_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("product"))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if no product has this code.
    pub async fn get_by_code(&self, code: &str) -> Result<Product, ServiceError> {
        self.store
            .product_by_code(code.trim())
            .await?
            .ok_or(ServiceError::NotFound("product"))
    }

    /// Create a product, generating a `SKU-XXXXXXXX` code when none is given.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for bad fields and `Conflict` for a duplicate code.
    #[tracing::instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: ProductInput) -> Result<Product, ServiceError> {
        let fields = validate(input)?;
        let now = Utc::now();

        let product = Product {
            id: ProductId::generate(),
            code: fields.code.unwrap_or_else(generate_code),
            name: fields.name,
            description: fields.description,
            brand: fields.brand,
            category: fields.category,
            color: fields.color,
            price: fields.price,
            stock: fields.stock,
            image_url: fields.image_url.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };

        self.store.insert_product(&product).await?;
        tracing::info!(product_id = %product.id, code = %product.code, "Product created");
        Ok(product)
    }

    /// Replace a product's fields. A missing code or image keeps the old one.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `InvalidInput` or `Conflict`.
    #[tracing::instrument(skip(self, input))]
    pub async fn update(&self, id: ProductId, input: ProductInput) -> Result<Product, ServiceError> {
        let fields = validate(input)?;
        let existing = self.get(id).await?;

        let product = Product {
            code: fields.code.unwrap_or(existing.code),
            name: fields.name,
            description: fields.description,
            brand: fields.brand,
            category: fields.category,
            color: fields.color,
            price: fields.price,
            stock: fields.stock,
            image_url: fields.image_url.unwrap_or(existing.image_url),
            updated_at: Utc::now(),
            ..existing
        };

        self.store
            .update_product(&product)
            .await
            .map_err(|e| match ServiceError::from(e) {
                ServiceError::NotFound(_) => ServiceError::NotFound("product"),
                other => other,
            })?;
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the product does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> Result<(), ServiceError> {
        if !self.store.delete_product(id).await? {
            return Err(ServiceError::NotFound("product"));
        }
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn count_products(&self) -> Result<i64, ServiceError> {
        Ok(self.store.count_products().await?)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn count_users(&self) -> Result<i64, ServiceError> {
        Ok(self.store.count_users().await?)
    }
}

fn validate(input: ProductInput) -> Result<ProductFields, ServiceError> {
    let name = input.name.trim().to_owned();
    if name.is_empty() {
        return Err(ServiceError::InvalidInput("name is required".to_owned()));
    }

    let price = Money::positive(input.price)?;

    let stock = i32::try_from(input.stock)
        .ok()
        .filter(|s| *s >= 0)
        .ok_or_else(|| ServiceError::InvalidInput("stock must be zero or more".to_owned()))?;

    Ok(ProductFields {
        code: non_empty(input.code),
        name,
        description: input.description.trim().to_owned(),
        brand: input.brand.trim().to_owned(),
        category: input.category.trim().to_owned(),
        color: input.color.trim().to_owned(),
        price,
        stock,
        image_url: non_empty(input.image_url),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// `SKU-` followed by 8 uppercase hex characters.
fn generate_code() -> String {
    let hex: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(8)
        .collect();
    format!("SKU-{}", hex.to_ascii_uppercase())
}

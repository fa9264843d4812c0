//! Catalog seeding.
//!
//! The input file is a JSON array in the same shape as the
//! `POST /api/products` body:
//!
//! ```json
//! [
//!   {"code": "SKU-RUN-01", "name": "Road Runner", "brand": "StepUp",
//!    "category": "running", "color": "white", "price": "450000", "stock": 12}
//! ]
//! ```

use std::path::Path;

use stepup_api::db::{PgStore, Store};
use stepup_api::models::ProductInput;
use stepup_api::services::ServiceError;
use stepup_api::services::catalog::CatalogService;
use thiserror::Error;

use super::{ConnectError, connect};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read {0}: {1}")]
    Read(String, std::io::Error),

    #[error("Invalid product file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Product '{name}' rejected: {source}")]
    Product {
        name: String,
        #[source]
        source: ServiceError,
    },
}

/// Counts from a seeding run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    pub skipped: usize,
}

/// Read products from `file` and insert them into the database.
pub async fn products(file: &Path) -> Result<SeedReport, SeedError> {
    let inputs = read_products(file).await?;
    let store = PgStore::new(connect().await?);
    insert_products(&store, inputs).await
}

async fn read_products(file: &Path) -> Result<Vec<ProductInput>, SeedError> {
    let raw = tokio::fs::read(file)
        .await
        .map_err(|e| SeedError::Read(file.display().to_string(), e))?;
    Ok(serde_json::from_slice(&raw)?)
}

/// Insert each product unless its code is already taken.
async fn insert_products(
    store: &dyn Store,
    inputs: Vec<ProductInput>,
) -> Result<SeedReport, SeedError> {
    let catalog = CatalogService::new(store);
    let mut report = SeedReport::default();

    for input in inputs {
        if let Some(code) = input.code.as_deref().map(str::trim).filter(|c| !c.is_empty())
            && store
                .product_by_code(code)
                .await
                .map_err(|e| SeedError::Product {
                    name: input.name.clone(),
                    source: e.into(),
                })?
                .is_some()
        {
            tracing::info!(code, "Skipping existing product");
            report.skipped += 1;
            continue;
        }

        let name = input.name.clone();
        let product = catalog
            .create(input)
            .await
            .map_err(|source| SeedError::Product { name, source })?;
        tracing::info!(code = %product.code, name = %product.name, "Inserted product");
        report.inserted += 1;
    }

    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use stepup_api::db::MemoryStore;

    use super::*;

    const PRODUCTS: &str = r#"[
        {"code": "SKU-RUN-01", "name": "Road Runner", "brand": "StepUp",
         "category": "running", "color": "white", "price": "450000", "stock": 12},
        {"name": "Court Classic", "price": "380000", "stock": 4}
    ]"#;

    #[tokio::test]
    async fn test_read_products_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(PRODUCTS.as_bytes()).unwrap();

        let inputs = read_products(file.path()).await.unwrap();
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0].code.as_deref(), Some("SKU-RUN-01"));
        assert!(inputs[1].code.is_none());
    }

    #[tokio::test]
    async fn test_seeding_twice_skips_existing_codes() {
        let store = MemoryStore::new();
        let inputs: Vec<ProductInput> = serde_json::from_str(PRODUCTS).unwrap();

        let first = insert_products(&store, inputs).await.unwrap();
        assert_eq!(
            first,
            SeedReport {
                inserted: 2,
                skipped: 0
            }
        );

        let again: Vec<ProductInput> = serde_json::from_str(PRODUCTS).unwrap();
        let second = insert_products(&store, again).await.unwrap();
        // The product without a code gets a fresh generated one each time.
        assert_eq!(
            second,
            SeedReport {
                inserted: 1,
                skipped: 1
            }
        );
    }

    #[tokio::test]
    async fn test_invalid_product_names_the_culprit() {
        let store = MemoryStore::new();
        let inputs: Vec<ProductInput> =
            serde_json::from_str(r#"[{"name": "Freebie", "price": "0", "stock": 1}]"#).unwrap();
        let err = insert_products(&store, inputs).await.unwrap_err();
        assert!(err.to_string().contains("Freebie"));
    }
}

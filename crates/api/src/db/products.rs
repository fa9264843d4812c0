//! Catalog queries.

use async_trait::async_trait;

use stepup_core::ProductId;

use super::{PgStore, ProductStore, RepositoryError, conflict_on_unique};
use crate::models::Product;

const PRODUCT_COLUMNS: &str = "id, code, name, description, brand, category, color, \
                               price, stock, image_url, created_at, updated_at";

#[async_trait]
impl ProductStore for PgStore {
    async fn insert_product(&self, product: &Product) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO products
                (id, code, name, description, brand, category, color,
                 price, stock, image_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ",
        )
        .bind(product.id)
        .bind(&product.code)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.brand)
        .bind(&product.category)
        .bind(&product.color)
        .bind(product.price)
        .bind(product.stock)
        .bind(&product.image_url)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| conflict_on_unique(e, "product code"))?;

        Ok(())
    }

    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(product)
    }

    async fn product_by_code(&self, code: &str) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(self.pool())
        .await?;

        Ok(product)
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool())
        .await?;

        Ok(products)
    }

    async fn update_product(&self, product: &Product) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE products
            SET code = $2, name = $3, description = $4, brand = $5, category = $6,
                color = $7, price = $8, stock = $9, image_url = $10, updated_at = $11
            WHERE id = $1
            ",
        )
        .bind(product.id)
        .bind(&product.code)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.brand)
        .bind(&product.category)
        .bind(&product.color)
        .bind(product.price)
        .bind(product.stock)
        .bind(&product.image_url)
        .bind(product.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| conflict_on_unique(e, "product code"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_products(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }
}

//! Checkout queries, including the atomic place-order transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;

use stepup_core::{CheckoutId, CheckoutStatus, Money, UserId};

use super::{CART_CHANGED, CheckoutStore, PgStore, RepositoryError};
use crate::models::{Cart, CartItem, Checkout};

const CHECKOUT_COLUMNS: &str = "id, user_id, user_name, items, total_price, address, \
                                phone_number, status, created_at, modified_at";

#[derive(sqlx::FromRow)]
struct CheckoutRow {
    id: CheckoutId,
    user_id: UserId,
    user_name: String,
    items: Json<Vec<CartItem>>,
    total_price: Money,
    address: String,
    phone_number: String,
    status: CheckoutStatus,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl From<CheckoutRow> for Checkout {
    fn from(row: CheckoutRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            user_name: row.user_name,
            items: row.items.0,
            total_price: row.total_price,
            address: row.address,
            phone_number: row.phone_number,
            status: row.status,
            created_at: row.created_at,
            modified_at: row.modified_at,
        }
    }
}

#[async_trait]
impl CheckoutStore for PgStore {
    async fn place_checkout(&self, checkout: &Checkout, cart: &Cart) -> Result<(), RepositoryError> {
        let mut tx = self.pool().begin().await?;

        // Deleting first also locks the cart row until commit.
        let deleted = sqlx::query(
            "DELETE FROM carts WHERE user_id = $1 AND id = $2 AND modified_at = $3",
        )
        .bind(checkout.user_id)
        .bind(cart.id)
        .bind(cart.modified_at)
        .execute(&mut *tx)
        .await?;

        if deleted.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(RepositoryError::Conflict(CART_CHANGED.to_owned()));
        }

        for item in &checkout.items {
            let quantity = i32::try_from(item.quantity)
                .map_err(|_| RepositoryError::InsufficientStock(item.product_id))?;

            let result = sqlx::query(
                r"
                UPDATE products
                SET stock = stock - $2, updated_at = now()
                WHERE id = $1 AND stock >= $2
                ",
            )
            .bind(item.product_id)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                tx.rollback().await?;
                return Err(RepositoryError::InsufficientStock(item.product_id));
            }
        }

        sqlx::query(
            r"
            INSERT INTO checkouts
                (id, user_id, user_name, items, total_price, address,
                 phone_number, status, created_at, modified_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ",
        )
        .bind(checkout.id)
        .bind(checkout.user_id)
        .bind(&checkout.user_name)
        .bind(Json(&checkout.items))
        .bind(checkout.total_price)
        .bind(&checkout.address)
        .bind(&checkout.phone_number)
        .bind(checkout.status)
        .bind(checkout.created_at)
        .bind(checkout.modified_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn checkout_by_id(&self, id: CheckoutId) -> Result<Option<Checkout>, RepositoryError> {
        let row = sqlx::query_as::<_, CheckoutRow>(&format!(
            "SELECT {CHECKOUT_COLUMNS} FROM checkouts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Checkout::from))
    }

    async fn list_checkouts(&self) -> Result<Vec<Checkout>, RepositoryError> {
        let rows = sqlx::query_as::<_, CheckoutRow>(&format!(
            "SELECT {CHECKOUT_COLUMNS} FROM checkouts ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Checkout::from).collect())
    }

    async fn list_checkouts_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Checkout>, RepositoryError> {
        let rows = sqlx::query_as::<_, CheckoutRow>(&format!(
            "SELECT {CHECKOUT_COLUMNS} FROM checkouts WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Checkout::from).collect())
    }

    async fn update_checkout_status(
        &self,
        id: CheckoutId,
        from: CheckoutStatus,
        to: CheckoutStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE checkouts
            SET status = $3, modified_at = $4
            WHERE id = $1 AND status = $2
            ",
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(at)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_checkout(&self, id: CheckoutId) -> Result<bool, RepositoryError> {
        // payments cascade
        let result = sqlx::query("DELETE FROM checkouts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

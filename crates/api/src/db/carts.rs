//! Cart queries.
//!
//! Items live in a JSONB column, one row per user.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;

use stepup_core::{CartId, UserId};

use super::{CartStore, PgStore, RepositoryError};
use crate::models::{Cart, CartItem};

#[derive(sqlx::FromRow)]
struct CartRow {
    id: CartId,
    user_id: UserId,
    items: Json<Vec<CartItem>>,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl From<CartRow> for Cart {
    fn from(row: CartRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            items: row.items.0,
            created_at: row.created_at,
            modified_at: row.modified_at,
        }
    }
}

#[async_trait]
impl CartStore for PgStore {
    async fn cart_for_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            r"
            SELECT id, user_id, items, created_at, modified_at
            FROM carts
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Cart::from))
    }

    async fn save_cart(&self, cart: &Cart) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO carts (id, user_id, items, created_at, modified_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id)
            DO UPDATE SET items = EXCLUDED.items, modified_at = EXCLUDED.modified_at
            ",
        )
        .bind(cart.id)
        .bind(cart.user_id)
        .bind(Json(&cart.items))
        .bind(cart.created_at)
        .bind(cart.modified_at)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn delete_cart(&self, user_id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM carts WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

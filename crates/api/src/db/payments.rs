//! Payment proof queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use stepup_core::{CheckoutId, PaymentId, PaymentStatus};

use super::{PaymentStore, PgStore, RepositoryError};
use crate::models::Payment;

const PAYMENT_COLUMNS: &str =
    "id, checkout_id, user_id, payment_image, status, created_at, modified_at";

#[async_trait]
impl PaymentStore for PgStore {
    async fn insert_payment(&self, payment: &Payment) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO payments
                (id, checkout_id, user_id, payment_image, status, created_at, modified_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(payment.id)
        .bind(payment.checkout_id)
        .bind(payment.user_id)
        .bind(&payment.payment_image)
        .bind(payment.status)
        .bind(payment.created_at)
        .bind(payment.modified_at)
        .execute(self.pool())
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;

        Ok(())
    }

    async fn payment_by_id(&self, id: PaymentId) -> Result<Option<Payment>, RepositoryError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(payment)
    }

    async fn latest_payment_for_checkout(
        &self,
        checkout_id: CheckoutId,
    ) -> Result<Option<Payment>, RepositoryError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE checkout_id = $1 \
             ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(checkout_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(payment)
    }

    async fn list_payments(&self) -> Result<Vec<Payment>, RepositoryError> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool())
        .await?;

        Ok(payments)
    }

    async fn update_payment_status(
        &self,
        id: PaymentId,
        from: PaymentStatus,
        to: PaymentStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE payments
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
}

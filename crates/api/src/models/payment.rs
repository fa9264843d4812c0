//! Payment proof record.

use chrono::{DateTime, Utc};
use serde::Serialize;

use stepup_core::{CheckoutId, PaymentId, PaymentStatus, UserId};

/// An uploaded proof of payment for a checkout.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Payment {
    pub id: PaymentId,
    pub checkout_id: CheckoutId,
    pub user_id: UserId,
    /// Public URL of the stored image.
    pub payment_image: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

//! Checkout record.

use chrono::{DateTime, Utc};
use serde::Serialize;

use stepup_core::{CheckoutId, CheckoutStatus, Money, UserId};

use super::CartItem;

/// A placed order awaiting payment review.
///
/// `items` is a frozen copy of the cart at checkout time.
#[derive(Debug, Clone, Serialize)]
pub struct Checkout {
    pub id: CheckoutId,
    pub user_id: UserId,
    pub user_name: String,
    pub items: Vec<CartItem>,
    pub total_price: Money,
    pub address: String,
    pub phone_number: String,
    pub status: CheckoutStatus,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

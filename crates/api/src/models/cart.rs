//! Shopping cart types.
//!
//! A user has at most one cart. Items are stored as one JSON document per
//! cart, so a cart is always read and written whole.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stepup_core::{CartId, Money, MoneyError, ProductId, UserId};

use super::Product;

/// One line in a cart or checkout.
///
/// Code, name, price and image are copied from the product when the line is
/// first added, so later catalog edits do not change an existing cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub product_code: String,
    pub product_name: String,
    pub quantity: u32,
    pub price: Money,
    pub image_url: String,
}

impl CartItem {
    /// Snapshot a product into a new line.
    #[must_use]
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            product_code: product.code.clone(),
            product_name: product.name.clone(),
            quantity,
            price: product.price,
            image_url: product.image_url.clone(),
        }
    }

    /// `price × quantity`.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Overflow` if the product does not fit.
    pub fn line_total(&self) -> Result<Money, MoneyError> {
        self.price.times(self.quantity)
    }
}

/// A user's cart.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Cart {
    /// Start a cart holding a single line.
    #[must_use]
    pub fn new(user_id: UserId, item: CartItem) -> Self {
        let now = Utc::now();
        Self {
            id: CartId::generate(),
            user_id,
            items: vec![item],
            created_at: now,
            modified_at: now,
        }
    }

    #[must_use]
    pub fn item(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    pub fn item_mut(&mut self, product_id: ProductId) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|i| i.product_id == product_id)
    }

    /// Sum of all line totals.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Overflow` if the total does not fit.
    pub fn total(&self) -> Result<Money, MoneyError> {
        Money::try_sum(self.items.iter().map(CartItem::line_total))
    }

    pub fn touch(&mut self) {
        self.modified_at = Utc::now();
    }
}

/// A cart as returned to its owner.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    #[serde(flatten)]
    pub cart: Cart,
    pub user_name: String,
    pub total_price: Money,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn item(price: i64, quantity: u32) -> CartItem {
        CartItem {
            product_id: ProductId::generate(),
            product_code: "SKU-00000001".to_owned(),
            product_name: "Court Classic".to_owned(),
            quantity,
            price: Money::new(Decimal::new(price, 0)),
            image_url: String::new(),
        }
    }

    #[test]
    fn test_total_sums_lines() {
        let mut cart = Cart::new(UserId::generate(), item(250, 2));
        cart.items.push(item(100, 3));
        assert_eq!(cart.total().unwrap(), Money::new(Decimal::new(800, 0)));
    }

    #[test]
    fn test_total_reports_overflow() {
        let mut line = item(1, u32::MAX);
        line.price = Money::new(Decimal::MAX);
        let cart = Cart::new(UserId::generate(), line);
        assert_eq!(cart.total(), Err(MoneyError::Overflow));
    }

    #[test]
    fn test_item_lookup_by_product() {
        let first = item(10, 1);
        let id = first.product_id;
        let mut cart = Cart::new(UserId::generate(), first);

        assert!(cart.item(ProductId::generate()).is_none());
        if let Some(line) = cart.item_mut(id) {
            line.quantity = 4;
        }
        assert_eq!(cart.item(id).map(|i| i.quantity), Some(4));
    }
}

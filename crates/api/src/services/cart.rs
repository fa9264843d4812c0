//! Cart manager.
//!
//! Every quantity change re-checks the product's current stock. The cart is
//! deleted as soon as its last line goes.

use stepup_core::{ProductId, UserId};

use super::ServiceError;
use crate::db::Store;
use crate::models::{Cart, CartItem, CartView};

pub struct CartService<'a> {
    store: &'a dyn Store,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Add `quantity` units, merging with an existing line for the product.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a quantity below 1, `NotFound` for an unknown
    /// product, `InsufficientStock` if the merged quantity exceeds stock.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Cart, ServiceError> {
        let quantity = parse_quantity(quantity)?;
        let product = self
            .store
            .product_by_id(product_id)
            .await?
            .ok_or(ServiceError::NotFound("product"))?;

        let existing = self.store.cart_for_user(user_id).await?;
        let in_cart = existing
            .as_ref()
            .and_then(|c| c.item(product_id))
            .map_or(0, |line| line.quantity);
        let merged = in_cart
            .checked_add(quantity)
            .ok_or_else(|| ServiceError::InvalidInput("quantity is too large".to_owned()))?;

        if !product.has_stock_for(merged) {
            return Err(ServiceError::InsufficientStock(product.name));
        }

        let cart = match existing {
            None => Cart::new(user_id, CartItem::from_product(&product, quantity)),
            Some(mut cart) => {
                match cart.item_mut(product_id) {
                    Some(line) => line.quantity = merged,
                    None => cart.items.push(CartItem::from_product(&product, quantity)),
                }
                cart.touch();
                cart
            }
        };

        self.store.save_cart(&cart).await?;
        tracing::debug!(%product_id, quantity = merged, "Cart line updated");
        Ok(cart)
    }

    /// Overwrite the quantity of an existing line.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a quantity below 1, `NotFound` if the cart, the line
    /// or the product is missing, `InsufficientStock` if stock is too low.
    #[tracing::instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Cart, ServiceError> {
        let quantity = parse_quantity(quantity)?;
        let mut cart = self.cart(user_id).await?;
        if cart.item(product_id).is_none() {
            return Err(ServiceError::NotFound("cart item"));
        }

        let product = self
            .store
            .product_by_id(product_id)
            .await?
            .ok_or(ServiceError::NotFound("product"))?;
        if !product.has_stock_for(quantity) {
            return Err(ServiceError::InsufficientStock(product.name));
        }

        if let Some(line) = cart.item_mut(product_id) {
            line.quantity = quantity;
        }
        cart.touch();
        self.store.save_cart(&cart).await?;
        Ok(cart)
    }

    /// Drop a line. Returns `None` when that emptied and deleted the cart.
    ///
    /// # Errors
    ///
    /// `NotFound` if the cart or the line is missing.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<Cart>, ServiceError> {
        let mut cart = self.cart(user_id).await?;
        let before = cart.items.len();
        cart.items.retain(|line| line.product_id != product_id);
        if cart.items.len() == before {
            return Err(ServiceError::NotFound("cart item"));
        }

        if cart.items.is_empty() {
            self.store.delete_cart(user_id).await?;
            tracing::debug!("Cart emptied and deleted");
            return Ok(None);
        }

        cart.touch();
        self.store.save_cart(&cart).await?;
        Ok(Some(cart))
    }

    /// The caller's cart with their display name and total.
    ///
    /// # Errors
    ///
    /// `NotFound` if the user has no cart.
    pub async fn get_cart(&self, user_id: UserId) -> Result<CartView, ServiceError> {
        let cart = self.cart(user_id).await?;
        let user = self
            .store
            .user_by_id(user_id)
            .await?
            .ok_or(ServiceError::NotFound("user"))?;

        Ok(CartView {
            total_price: cart.total()?,
            user_name: user.name,
            cart,
        })
    }

    async fn cart(&self, user_id: UserId) -> Result<Cart, ServiceError> {
        self.store
            .cart_for_user(user_id)
            .await?
            .ok_or(ServiceError::NotFound("cart"))
    }
}

fn parse_quantity(quantity: i64) -> Result<u32, ServiceError> {
    if quantity < 1 {
        return Err(ServiceError::InvalidInput(
            "quantity must be at least 1".to_owned(),
        ));
    }
    u32::try_from(quantity)
        .map_err(|_| ServiceError::InvalidInput("quantity is too large".to_owned()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use stepup_core::{Money, UserRole};

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::Product;
    use crate::services::auth::create_account;

    async fn seed_product(store: &MemoryStore, stock: i32) -> Product {
        let now = Utc::now();
        let product = Product {
            id: ProductId::generate(),
            code: format!("SKU-{}", &ProductId::generate().to_string()[..8]),
            name: "Trail Blazer".to_owned(),
            description: String::new(),
            brand: "StepUp".to_owned(),
            category: "trail".to_owned(),
            color: "green".to_owned(),
            price: Money::new(Decimal::new(300, 0)),
            stock,
            image_url: "http://localhost:3000/uploads/tb.png".to_owned(),
            created_at: now,
            updated_at: now,
        };
        crate::db::ProductStore::insert_product(store, &product)
            .await
            .unwrap();
        product
    }

    #[tokio::test]
    async fn test_add_unknown_product_leaves_cart_unchanged() {
        let store = MemoryStore::new();
        let carts = CartService::new(&store);
        let user = UserId::generate();
        let product = seed_product(&store, 5).await;
        carts.add_item(user, product.id, 1).await.unwrap();

        let err = carts
            .add_item(user, ProductId::generate(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound("product")));

        let cart = crate::db::CartStore::cart_for_user(&store, user)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cart.items.len(), 1);
    }

    #[tokio::test]
    async fn test_add_more_than_stock_changes_nothing() {
        let store = MemoryStore::new();
        let carts = CartService::new(&store);
        let user = UserId::generate();
        let product = seed_product(&store, 3).await;

        let err = carts.add_item(user, product.id, 4).await.unwrap_err();
        assert!(matches!(err, ServiceError::InsufficientStock(name) if name == "Trail Blazer"));
        assert!(
            crate::db::CartStore::cart_for_user(&store, user)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_add_same_product_merges_and_rechecks_stock() {
        let store = MemoryStore::new();
        let carts = CartService::new(&store);
        let user = UserId::generate();
        let product = seed_product(&store, 5).await;

        carts.add_item(user, product.id, 2).await.unwrap();
        let cart = carts.add_item(user, product.id, 3).await.unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 5);
        assert_eq!(cart.items[0].price, product.price);

        let err = carts.add_item(user, product.id, 1).await.unwrap_err();
        assert!(matches!(err, ServiceError::InsufficientStock(_)));
    }

    #[tokio::test]
    async fn test_quantity_must_be_positive() {
        let store = MemoryStore::new();
        let carts = CartService::new(&store);
        let product = seed_product(&store, 5).await;

        for bad in [0, -3] {
            assert!(matches!(
                carts.add_item(UserId::generate(), product.id, bad).await,
                Err(ServiceError::InvalidInput(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_update_quantity_above_stock_is_rejected() {
        let store = MemoryStore::new();
        let carts = CartService::new(&store);
        let user = UserId::generate();
        let product = seed_product(&store, 4).await;
        carts.add_item(user, product.id, 1).await.unwrap();

        let err = carts
            .update_quantity(user, product.id, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InsufficientStock(_)));

        let cart = carts.update_quantity(user, product.id, 4).await.unwrap();
        assert_eq!(cart.items[0].quantity, 4);
    }

    #[tokio::test]
    async fn test_update_missing_line_is_not_found() {
        let store = MemoryStore::new();
        let carts = CartService::new(&store);
        let user = UserId::generate();
        let product = seed_product(&store, 4).await;

        assert!(matches!(
            carts.update_quantity(user, product.id, 1).await,
            Err(ServiceError::NotFound("cart"))
        ));

        carts.add_item(user, product.id, 1).await.unwrap();
        assert!(matches!(
            carts.update_quantity(user, ProductId::generate(), 1).await,
            Err(ServiceError::NotFound("cart item"))
        ));
    }

    #[tokio::test]
    async fn test_removing_last_item_deletes_cart() {
        let store = MemoryStore::new();
        let carts = CartService::new(&store);
        let user = create_account(&store, "ayu@example.com", "password1", "Ayu", UserRole::Customer)
            .await
            .unwrap();
        let first = seed_product(&store, 4).await;
        let second = seed_product(&store, 4).await;

        carts.add_item(user.id, first.id, 1).await.unwrap();
        carts.add_item(user.id, second.id, 2).await.unwrap();

        let view = carts.get_cart(user.id).await.unwrap();
        assert_eq!(view.user_name, "Ayu");
        assert_eq!(view.total_price, Money::new(Decimal::new(900, 0)));

        let remaining = carts.remove_item(user.id, first.id).await.unwrap();
        assert_eq!(remaining.map(|c| c.items.len()), Some(1));

        assert!(carts.remove_item(user.id, second.id).await.unwrap().is_none());
        assert!(matches!(
            carts.get_cart(user.id).await,
            Err(ServiceError::NotFound("cart"))
        ));
        assert!(matches!(
            carts.remove_item(user.id, second.id).await,
            Err(ServiceError::NotFound("cart"))
        ));
    }
}

//! In-memory store.
//!
//! All state sits behind one `RwLock`, so each trait method is atomic with
//! respect to every other. `place_checkout` validates the cart snapshot and
//! every stock guard before touching anything, which gives the same
//! all-or-nothing result as the Postgres transaction.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use stepup_core::{
    CheckoutId, CheckoutStatus, Email, PaymentId, PaymentStatus, ProductId, UserId,
};

use super::{
    CART_CHANGED, CartStore, CheckoutStore, PaymentStore, ProductStore, RepositoryError, Store,
    UserStore,
};
use crate::models::{Cart, Checkout, Payment, Product, User};

#[derive(Default)]
struct Data {
    users: Vec<User>,
    products: Vec<Product>,
    carts: HashMap<UserId, Cart>,
    checkouts: Vec<Checkout>,
    payments: Vec<Payment>,
}

/// Process-local store used by tests and demos.
///
/// Collections keep insertion order. "Newest first" listings walk them in
/// reverse.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<Data>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<(), RepositoryError> {
        let mut data = self.data.write().await;
        if data.users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        data.users.push(user.clone());
        Ok(())
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.users.iter().find(|u| u.id == id).cloned())
    }

    async fn user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.users.iter().find(|u| &u.email == email).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.users.iter().rev().cloned().collect())
    }

    async fn count_users(&self) -> Result<i64, RepositoryError> {
        let data = self.data.read().await;
        Ok(count(data.users.len()))
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn insert_product(&self, product: &Product) -> Result<(), RepositoryError> {
        let mut data = self.data.write().await;
        if data.products.iter().any(|p| p.code == product.code) {
            return Err(RepositoryError::Conflict(
                "product code already exists".to_owned(),
            ));
        }
        data.products.push(product.clone());
        Ok(())
    }

    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.products.iter().find(|p| p.id == id).cloned())
    }

    async fn product_by_code(&self, code: &str) -> Result<Option<Product>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.products.iter().find(|p| p.code == code).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.products.iter().rev().cloned().collect())
    }

    async fn update_product(&self, product: &Product) -> Result<(), RepositoryError> {
        let mut data = self.data.write().await;
        if data
            .products
            .iter()
            .any(|p| p.code == product.code && p.id != product.id)
        {
            return Err(RepositoryError::Conflict(
                "product code already exists".to_owned(),
            ));
        }
        let slot = data
            .products
            .iter_mut()
            .find(|p| p.id == product.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = product.clone();
        Ok(())
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let mut data = self.data.write().await;
        let before = data.products.len();
        data.products.retain(|p| p.id != id);
        Ok(data.products.len() < before)
    }

    async fn count_products(&self) -> Result<i64, RepositoryError> {
        let data = self.data.read().await;
        Ok(count(data.products.len()))
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn cart_for_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.carts.get(&user_id).cloned())
    }

    async fn save_cart(&self, cart: &Cart) -> Result<(), RepositoryError> {
        let mut data = self.data.write().await;
        data.carts.insert(cart.user_id, cart.clone());
        Ok(())
    }

    async fn delete_cart(&self, user_id: UserId) -> Result<bool, RepositoryError> {
        let mut data = self.data.write().await;
        Ok(data.carts.remove(&user_id).is_some())
    }
}

#[async_trait]
impl CheckoutStore for MemoryStore {
    async fn place_checkout(&self, checkout: &Checkout, cart: &Cart) -> Result<(), RepositoryError> {
        let mut data = self.data.write().await;

        let unchanged = data
            .carts
            .get(&checkout.user_id)
            .is_some_and(|c| c.id == cart.id && c.modified_at == cart.modified_at);
        if !unchanged {
            return Err(RepositoryError::Conflict(CART_CHANGED.to_owned()));
        }

        // Check every guard first so a failure leaves no partial decrement.
        let mut decrements = Vec::with_capacity(checkout.items.len());
        for item in &checkout.items {
            let guard = data
                .products
                .iter()
                .position(|p| p.id == item.product_id && p.has_stock_for(item.quantity))
                .zip(i32::try_from(item.quantity).ok());
            match guard {
                Some(decrement) => decrements.push(decrement),
                None => return Err(RepositoryError::InsufficientStock(item.product_id)),
            }
        }

        let now = Utc::now();
        for (index, quantity) in decrements {
            if let Some(product) = data.products.get_mut(index) {
                product.stock -= quantity;
                product.updated_at = now;
            }
        }

        data.checkouts.push(checkout.clone());
        data.carts.remove(&checkout.user_id);
        Ok(())
    }

    async fn checkout_by_id(&self, id: CheckoutId) -> Result<Option<Checkout>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.checkouts.iter().find(|c| c.id == id).cloned())
    }

    async fn list_checkouts(&self) -> Result<Vec<Checkout>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.checkouts.iter().rev().cloned().collect())
    }

    async fn list_checkouts_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Checkout>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data
            .checkouts
            .iter()
            .rev()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_checkout_status(
        &self,
        id: CheckoutId,
        from: CheckoutStatus,
        to: CheckoutStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut data = self.data.write().await;
        match data
            .checkouts
            .iter_mut()
            .find(|c| c.id == id && c.status == from)
        {
            Some(checkout) => {
                checkout.status = to;
                checkout.modified_at = at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_checkout(&self, id: CheckoutId) -> Result<bool, RepositoryError> {
        let mut data = self.data.write().await;
        let before = data.checkouts.len();
        data.checkouts.retain(|c| c.id != id);
        let deleted = data.checkouts.len() < before;
        if deleted {
            data.payments.retain(|p| p.checkout_id != id);
        }
        Ok(deleted)
    }
}

#[async_trait]
impl PaymentStore for MemoryStore {
    async fn insert_payment(&self, payment: &Payment) -> Result<(), RepositoryError> {
        let mut data = self.data.write().await;
        if !data.checkouts.iter().any(|c| c.id == payment.checkout_id) {
            return Err(RepositoryError::NotFound);
        }
        data.payments.push(payment.clone());
        Ok(())
    }

    async fn payment_by_id(&self, id: PaymentId) -> Result<Option<Payment>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.payments.iter().find(|p| p.id == id).cloned())
    }

    async fn latest_payment_for_checkout(
        &self,
        checkout_id: CheckoutId,
    ) -> Result<Option<Payment>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data
            .payments
            .iter()
            .rev()
            .find(|p| p.checkout_id == checkout_id)
            .cloned())
    }

    async fn list_payments(&self) -> Result<Vec<Payment>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.payments.iter().rev().cloned().collect())
    }

    async fn update_payment_status(
        &self,
        id: PaymentId,
        from: PaymentStatus,
        to: PaymentStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut data = self.data.write().await;
        match data
            .payments
            .iter_mut()
            .find(|p| p.id == id && p.status == from)
        {
            Some(payment) => {
                payment.status = to;
                payment.modified_at = at;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

fn count(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use stepup_core::{CartId, Money};

    use super::*;
    use crate::models::CartItem;

    fn product(code: &str, stock: i32) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::generate(),
            code: code.to_owned(),
            name: format!("Shoe {code}"),
            description: String::new(),
            brand: "StepUp".to_owned(),
            category: "running".to_owned(),
            color: "black".to_owned(),
            price: Money::new(Decimal::new(100, 0)),
            stock,
            image_url: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn checkout_for(user_id: UserId, lines: &[(&Product, u32)]) -> Checkout {
        let items: Vec<CartItem> = lines
            .iter()
            .map(|(p, q)| CartItem::from_product(p, *q))
            .collect();
        let now = Utc::now();
        Checkout {
            id: CheckoutId::generate(),
            user_id,
            user_name: "Dewi".to_owned(),
            total_price: Money::try_sum(items.iter().map(CartItem::line_total)).unwrap(),
            items,
            address: "Jl. Merdeka 10".to_owned(),
            phone_number: "081234567890".to_owned(),
            status: CheckoutStatus::Pending,
            created_at: now,
            modified_at: now,
        }
    }

    /// Store a cart holding the checkout's lines and return the snapshot.
    async fn cart_for(store: &MemoryStore, checkout: &Checkout) -> Cart {
        let now = Utc::now();
        let cart = Cart {
            id: CartId::generate(),
            user_id: checkout.user_id,
            items: checkout.items.clone(),
            created_at: now,
            modified_at: now,
        };
        store.save_cart(&cart).await.unwrap();
        cart
    }

    #[tokio::test]
    async fn test_place_checkout_is_all_or_nothing() {
        let store = MemoryStore::new();
        let plenty = product("A", 10);
        let scarce = product("B", 1);
        store.insert_product(&plenty).await.unwrap();
        store.insert_product(&scarce).await.unwrap();

        let user_id = UserId::generate();
        let checkout = checkout_for(user_id, &[(&plenty, 2), (&scarce, 3)]);
        let cart = cart_for(&store, &checkout).await;
        let err = store.place_checkout(&checkout, &cart).await.unwrap_err();
        assert!(matches!(err, RepositoryError::InsufficientStock(id) if id == scarce.id));

        let a = store.product_by_id(plenty.id).await.unwrap().unwrap();
        assert_eq!(a.stock, 10);
        assert!(store.cart_for_user(user_id).await.unwrap().is_some());
        assert!(store.list_checkouts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_place_checkout_commits_everything() {
        let store = MemoryStore::new();
        let a = product("A", 5);
        store.insert_product(&a).await.unwrap();
        let user_id = UserId::generate();
        let checkout = checkout_for(user_id, &[(&a, 2)]);
        let cart = cart_for(&store, &checkout).await;
        store.place_checkout(&checkout, &cart).await.unwrap();

        assert_eq!(store.product_by_id(a.id).await.unwrap().unwrap().stock, 3);
        assert!(store.cart_for_user(user_id).await.unwrap().is_none());
        assert_eq!(store.list_checkouts_for_user(user_id).await.unwrap().len(), 1);
    }

    /// A line added after the checkout read its cart is neither ordered nor lost.
    #[tokio::test]
    async fn test_place_checkout_rejects_changed_cart() {
        let store = MemoryStore::new();
        let a = product("A", 5);
        let b = product("B", 5);
        store.insert_product(&a).await.unwrap();
        store.insert_product(&b).await.unwrap();

        let user_id = UserId::generate();
        let checkout = checkout_for(user_id, &[(&a, 2)]);
        let snapshot = cart_for(&store, &checkout).await;

        let mut newer = snapshot.clone();
        newer.items.push(CartItem::from_product(&b, 1));
        newer.modified_at = snapshot.modified_at + chrono::Duration::milliseconds(1);
        store.save_cart(&newer).await.unwrap();

        let err = store.place_checkout(&checkout, &snapshot).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(msg) if msg == CART_CHANGED));

        assert_eq!(store.product_by_id(a.id).await.unwrap().unwrap().stock, 5);
        let cart = store.cart_for_user(user_id).await.unwrap().unwrap();
        assert_eq!(cart.items.len(), 2);
        assert!(store.list_checkouts().await.unwrap().is_empty());

        // A deleted cart is a changed cart too.
        store.delete_cart(user_id).await.unwrap();
        assert!(matches!(
            store.place_checkout(&checkout, &newer).await,
            Err(RepositoryError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_status_update_is_compare_and_set() {
        let store = MemoryStore::new();
        let a = product("A", 5);
        store.insert_product(&a).await.unwrap();
        let checkout = checkout_for(UserId::generate(), &[(&a, 1)]);
        let cart = cart_for(&store, &checkout).await;
        store.place_checkout(&checkout, &cart).await.unwrap();

        let now = Utc::now();
        assert!(
            store
                .update_checkout_status(
                    checkout.id,
                    CheckoutStatus::Pending,
                    CheckoutStatus::Completed,
                    now
                )
                .await
                .unwrap()
        );
        assert!(
            !store
                .update_checkout_status(
                    checkout.id,
                    CheckoutStatus::Pending,
                    CheckoutStatus::Cancelled,
                    now
                )
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_duplicate_product_code_conflicts() {
        let store = MemoryStore::new();
        store.insert_product(&product("SKU-1", 1)).await.unwrap();
        let err = store.insert_product(&product("SKU-1", 2)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_delete_checkout_cascades_to_payments() {
        let store = MemoryStore::new();
        let a = product("A", 5);
        store.insert_product(&a).await.unwrap();
        let checkout = checkout_for(UserId::generate(), &[(&a, 1)]);
        let cart = cart_for(&store, &checkout).await;
        store.place_checkout(&checkout, &cart).await.unwrap();

        let now = Utc::now();
        store
            .insert_payment(&Payment {
                id: PaymentId::generate(),
                checkout_id: checkout.id,
                user_id: checkout.user_id,
                payment_image: "http://localhost/payment/x.png".to_owned(),
                status: PaymentStatus::Pending,
                created_at: now,
                modified_at: now,
            })
            .await
            .unwrap();

        assert!(store.delete_checkout(checkout.id).await.unwrap());
        assert!(store.list_payments().await.unwrap().is_empty());
        assert!(!store.delete_checkout(checkout.id).await.unwrap());
    }
}

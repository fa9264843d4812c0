//! Checkout processor.
//!
//! Turns a cart into an order. Stock is decremented inside the store's
//! `place_checkout` step, which either applies every line or none.

use chrono::Utc;

use stepup_core::{CheckoutId, CheckoutStatus, UserId};

use super::ServiceError;
use crate::db::{RepositoryError, Store};
use crate::models::Checkout;
use crate::services::auth::AuthUser;

const ADDRESS_LENGTH: std::ops::RangeInclusive<usize> = 5..=100;
const PHONE_LENGTH: std::ops::RangeInclusive<usize> = 10..=15;

pub struct CheckoutService<'a> {
    store: &'a dyn Store,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Place an order from the caller's cart.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a bad address or phone, `NotFound` if the cart or a
    /// product is gone, `InsufficientStock` if any line cannot be filled and
    /// `Conflict` if the cart changed while the order was being placed.
    #[tracing::instrument(skip(self, address, phone_number))]
    pub async fn create(
        &self,
        user_id: UserId,
        address: &str,
        phone_number: &str,
    ) -> Result<Checkout, ServiceError> {
        let address = validate_address(address)?;
        let phone_number = validate_phone(phone_number)?;

        let cart = self
            .store
            .cart_for_user(user_id)
            .await?
            .ok_or(ServiceError::NotFound("cart"))?;

        for line in &cart.items {
            let product = self
                .store
                .product_by_id(line.product_id)
                .await?
                .ok_or(ServiceError::NotFound("product"))?;
            if !product.has_stock_for(line.quantity) {
                return Err(ServiceError::InsufficientStock(product.name));
            }
        }

        let user_name = self
            .store
            .user_by_id(user_id)
            .await?
            .map(|u| u.name)
            .unwrap_or_default();

        let now = Utc::now();
        let checkout = Checkout {
            id: CheckoutId::generate(),
            user_id,
            user_name,
            total_price: cart.total()?,
            items: cart.items.clone(),
            address,
            phone_number,
            status: CheckoutStatus::Pending,
            created_at: now,
            modified_at: now,
        };

        if let Err(e) = self.store.place_checkout(&checkout, &cart).await {
            return Err(match e {
                RepositoryError::InsufficientStock(product_id) => {
                    let name = checkout
                        .items
                        .iter()
                        .find(|line| line.product_id == product_id)
                        .map_or_else(|| product_id.to_string(), |line| line.product_name.clone());
                    ServiceError::InsufficientStock(name)
                }
                other => other.into(),
            });
        }

        tracing::info!(
            checkout_id = %checkout.id,
            total = %checkout.total_price,
            lines = checkout.items.len(),
            "Checkout placed"
        );
        Ok(checkout)
    }

    /// Move a checkout along its lifecycle.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an unknown status, `NotFound`, or
    /// `InvalidTransition` if the lifecycle forbids the change.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: CheckoutId,
        status: &str,
    ) -> Result<Checkout, ServiceError> {
        let next: CheckoutStatus = status
            .parse()
            .map_err(|e: stepup_core::ParseStatusError| ServiceError::InvalidInput(e.to_string()))?;
        let mut checkout = self.fetch(id).await?;

        if !checkout.status.can_transition_to(next) {
            return Err(invalid_transition(checkout.status, next));
        }

        let now = Utc::now();
        if !self
            .store
            .update_checkout_status(id, checkout.status, next, now)
            .await?
        {
            // Lost a race with another update.
            let current = self.fetch(id).await?;
            return Err(invalid_transition(current.status, next));
        }

        tracing::info!(checkout_id = %id, from = %checkout.status, to = %next, "Checkout status changed");
        checkout.status = next;
        checkout.modified_at = now;
        Ok(checkout)
    }

    /// # Errors
    ///
    /// `NotFound` on a miss, `Forbidden` if the caller neither owns the
    /// checkout nor is an admin.
    pub async fn get(&self, id: CheckoutId, caller: AuthUser) -> Result<Checkout, ServiceError> {
        let checkout = self.fetch(id).await?;
        if !caller.can_access(checkout.user_id) {
            return Err(ServiceError::Forbidden(
                "checkout belongs to another user".to_owned(),
            ));
        }
        Ok(checkout)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn list_all(&self) -> Result<Vec<Checkout>, ServiceError> {
        Ok(self.store.list_checkouts().await?)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Checkout>, ServiceError> {
        Ok(self.store.list_checkouts_for_user(user_id).await?)
    }

    /// Delete a checkout together with its payments.
    ///
    /// # Errors
    ///
    /// `NotFound` if the checkout does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: CheckoutId) -> Result<(), ServiceError> {
        if !self.store.delete_checkout(id).await? {
            return Err(ServiceError::NotFound("checkout"));
        }
        tracing::info!(checkout_id = %id, "Checkout deleted");
        Ok(())
    }

    async fn fetch(&self, id: CheckoutId) -> Result<Checkout, ServiceError> {
        self.store
            .checkout_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("checkout"))
    }
}

pub(crate) fn invalid_transition(from: impl ToString, to: impl ToString) -> ServiceError {
    ServiceError::InvalidTransition {
        from: from.to_string(),
        to: to.to_string(),
    }
}

fn validate_address(address: &str) -> Result<String, ServiceError> {
    let address = address.trim();
    if !ADDRESS_LENGTH.contains(&address.chars().count()) {
        return Err(ServiceError::InvalidInput(format!(
            "address must be {} to {} characters",
            ADDRESS_LENGTH.start(),
            ADDRESS_LENGTH.end()
        )));
    }
    Ok(address.to_owned())
}

/// Digits with an optional leading `+`, 10 to 15 characters in total.
fn validate_phone(phone: &str) -> Result<String, ServiceError> {
    let phone = phone.trim();
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    let valid = PHONE_LENGTH.contains(&phone.len())
        && !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit());
    if !valid {
        return Err(ServiceError::InvalidInput(
            "phone number must be 10 to 15 digits, optionally starting with +".to_owned(),
        ));
    }
    Ok(phone.to_owned())
}

//! Payment proof recorder.

use chrono::Utc;

use stepup_core::{CheckoutId, PaymentId, PaymentStatus, ParseStatusError};

use super::checkout::invalid_transition;
use super::storage::FileStorage;
use super::ServiceError;
use crate::db::Store;
use crate::models::Payment;
use crate::services::auth::AuthUser;

pub struct PaymentService<'a> {
    store: &'a dyn Store,
    storage: &'a FileStorage,
    base_url: &'a str,
}

impl<'a> PaymentService<'a> {
    /// `base_url` prefixes the stored image's public URL.
    #[must_use]
    pub const fn new(store: &'a dyn Store, storage: &'a FileStorage, base_url: &'a str) -> Self {
        Self {
            store,
            storage,
            base_url,
        }
    }

    /// Store an uploaded proof and record a `Pending` payment for it.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a missing, empty or non-image file, `NotFound` for
    /// an unknown checkout, `Forbidden` for someone else's checkout and
    /// `Storage` if the file cannot be written.
    #[tracing::instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn save_proof(
        &self,
        checkout_id: CheckoutId,
        caller: AuthUser,
        file_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<Payment, ServiceError> {
        let file_name = file_name
            .filter(|_| !bytes.is_empty())
            .ok_or_else(|| ServiceError::InvalidInput("payment_image is required".to_owned()))?;
        self.storage.check_extension(file_name)?;

        let checkout = self
            .store
            .checkout_by_id(checkout_id)
            .await?
            .ok_or(ServiceError::NotFound("checkout"))?;
        if !caller.can_access(checkout.user_id) {
            return Err(ServiceError::Forbidden(
                "checkout belongs to another user".to_owned(),
            ));
        }

        let stored = self.storage.save(file_name, bytes).await?;
        let now = Utc::now();
        let payment = Payment {
            id: PaymentId::generate(),
            checkout_id,
            user_id: checkout.user_id,
            payment_image: self.storage.public_url(self.base_url, &stored),
            status: PaymentStatus::Pending,
            created_at: now,
            modified_at: now,
        };

        if let Err(e) = self.store.insert_payment(&payment).await {
            if let Err(cleanup) = self.storage.remove(&stored).await {
                tracing::warn!(error = %cleanup, file = %stored, "Failed to remove orphaned proof");
            }
            return Err(match ServiceError::from(e) {
                ServiceError::NotFound(_) => ServiceError::NotFound("checkout"),
                other => other,
            });
        }

        tracing::info!(payment_id = %payment.id, %checkout_id, "Payment proof recorded");
        Ok(payment)
    }

    /// Review a payment.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an unknown status, `NotFound`, or
    /// `InvalidTransition` once the payment has been reviewed.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: PaymentId,
        status: &str,
    ) -> Result<Payment, ServiceError> {
        let next: PaymentStatus = status
            .parse()
            .map_err(|e: ParseStatusError| ServiceError::InvalidInput(e.to_string()))?;
        let mut payment = self.fetch(id).await?;

        if !payment.status.can_transition_to(next) {
            return Err(invalid_transition(payment.status, next));
        }

        let now = Utc::now();
        if !self
            .store
            .update_payment_status(id, payment.status, next, now)
            .await?
        {
            let current = self.fetch(id).await?;
            return Err(invalid_transition(current.status, next));
        }

        tracing::info!(payment_id = %id, from = %payment.status, to = %next, "Payment status changed");
        payment.status = next;
        payment.modified_at = now;
        Ok(payment)
    }

    /// The most recent proof uploaded for a checkout.
    ///
    /// # Errors
    ///
    /// `NotFound` if the checkout or its payment is missing, `Forbidden` if
    /// the caller neither owns the checkout nor is an admin.
    pub async fn latest_for_checkout(
        &self,
        checkout_id: CheckoutId,
        caller: AuthUser,
    ) -> Result<Payment, ServiceError> {
        let checkout = self
            .store
            .checkout_by_id(checkout_id)
            .await?
            .ok_or(ServiceError::NotFound("checkout"))?;
        if !caller.can_access(checkout.user_id) {
            return Err(ServiceError::Forbidden(
                "checkout belongs to another user".to_owned(),
            ));
        }

        self.store
            .latest_payment_for_checkout(checkout_id)
            .await?
            .ok_or(ServiceError::NotFound("payment"))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn list_all(&self) -> Result<Vec<Payment>, ServiceError> {
        Ok(self.store.list_payments().await?)
    }

    async fn fetch(&self, id: PaymentId) -> Result<Payment, ServiceError> {
        self.store
            .payment_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("payment"))
    }
}

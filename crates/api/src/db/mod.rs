//! Data store access.
//!
//! # Stores
//!
//! The services talk to a [`Store`], which bundles one trait per aggregate:
//!
//! - [`UserStore`] - accounts
//! - [`ProductStore`] - catalog
//! - [`CartStore`] - one cart document per user
//! - [`CheckoutStore`] - checkouts, including the atomic place-order step
//! - [`PaymentStore`] - payment proofs
//!
//! Two implementations exist: [`PgStore`] for `PostgreSQL` and
//! [`MemoryStore`], which keeps everything behind a single lock and backs the
//! test suites.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p stepup-cli -- migrate
//! ```

pub mod carts;
pub mod checkouts;
pub mod memory;
pub mod payments;
pub mod products;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use stepup_core::{
    CheckoutId, CheckoutStatus, Email, PaymentId, PaymentStatus, ProductId, UserId,
};

use crate::models::{Cart, Checkout, Payment, Product, User};

pub use memory::MemoryStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A guarded stock decrement matched no row.
    #[error("insufficient stock for product {0}")]
    InsufficientStock(ProductId),
}

/// `Conflict` message when a cart changes between checkout read and write.
pub const CART_CHANGED: &str = "cart changed during checkout, review it and try again";

/// Map a unique violation to `Conflict`, anything else to `Database`.
pub(crate) fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. `Conflict` if the email is taken.
    async fn insert_user(&self, user: &User) -> Result<(), RepositoryError>;
    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    async fn user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;
    /// All users, newest first.
    async fn list_users(&self) -> Result<Vec<User>, RepositoryError>;
    async fn count_users(&self) -> Result<i64, RepositoryError>;
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Insert a new product. `Conflict` if the code is taken.
    async fn insert_product(&self, product: &Product) -> Result<(), RepositoryError>;
    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;
    async fn product_by_code(&self, code: &str) -> Result<Option<Product>, RepositoryError>;
    /// All products, newest first.
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError>;
    /// Overwrite every editable field. `NotFound` or `Conflict` on failure.
    async fn update_product(&self, product: &Product) -> Result<(), RepositoryError>;
    /// Returns `false` if the product did not exist.
    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError>;
    async fn count_products(&self) -> Result<i64, RepositoryError>;
}

#[async_trait]
pub trait CartStore: Send + Sync {
    async fn cart_for_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError>;
    /// Insert or replace the user's cart document.
    async fn save_cart(&self, cart: &Cart) -> Result<(), RepositoryError>;
    /// Returns `false` if the user had no cart.
    async fn delete_cart(&self, user_id: UserId) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait CheckoutStore: Send + Sync {
    /// Place an order in one atomic step.
    ///
    /// Deletes `cart`, decrements stock for every line with a
    /// `stock >= quantity` guard and inserts the checkout.
    ///
    /// `cart` is the snapshot the checkout was built from. If the stored cart
    /// no longer has the same id and `modified_at`, nothing is written and
    /// the result is `Conflict`. If any stock guard fails nothing is written
    /// and `InsufficientStock` names the product.
    async fn place_checkout(&self, checkout: &Checkout, cart: &Cart) -> Result<(), RepositoryError>;
    async fn checkout_by_id(&self, id: CheckoutId) -> Result<Option<Checkout>, RepositoryError>;
    /// All checkouts, newest first.
    async fn list_checkouts(&self) -> Result<Vec<Checkout>, RepositoryError>;
    /// One user's checkouts, newest first.
    async fn list_checkouts_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Checkout>, RepositoryError>;
    /// Compare-and-set the status. Returns `false` if the checkout is missing
    /// or no longer in `from`.
    async fn update_checkout_status(
        &self,
        id: CheckoutId,
        from: CheckoutStatus,
        to: CheckoutStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;
    /// Delete a checkout and its payments. Returns `false` if it did not exist.
    async fn delete_checkout(&self, id: CheckoutId) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn insert_payment(&self, payment: &Payment) -> Result<(), RepositoryError>;
    async fn payment_by_id(&self, id: PaymentId) -> Result<Option<Payment>, RepositoryError>;
    /// Most recent payment recorded for a checkout.
    async fn latest_payment_for_checkout(
        &self,
        checkout_id: CheckoutId,
    ) -> Result<Option<Payment>, RepositoryError>;
    /// All payments, newest first.
    async fn list_payments(&self) -> Result<Vec<Payment>, RepositoryError>;
    /// Compare-and-set the status. Returns `false` if the payment is missing
    /// or no longer in `from`.
    async fn update_payment_status(
        &self,
        id: PaymentId,
        from: PaymentStatus,
        to: PaymentStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;
}

/// Everything the services need from persistence.
#[async_trait]
pub trait Store: UserStore + ProductStore + CartStore + CheckoutStore + PaymentStore {
    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// `PostgreSQL`-backed store.
///
/// Queries are split by aggregate across the sibling modules.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

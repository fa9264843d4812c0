//! Admin account management.
//!
//! Self-registration over HTTP always creates customers, so admins are made
//! here.
//!
//! # Environment Variables
//!
//! - `STEPUP_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use stepup_api::db::PgStore;
use stepup_api::services::auth::{AuthError, create_account};
use stepup_core::{UserId, UserRole};
use thiserror::Error;

use super::{ConnectError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Admin user already exists with email: {0}")]
    UserExists(String),

    #[error(transparent)]
    Auth(AuthError),
}

/// Create a new admin account.
///
/// # Returns
///
/// The ID of the created user.
pub async fn create_admin(email: &str, name: &str, password: &str) -> Result<UserId, AdminError> {
    let store = PgStore::new(connect().await?);

    tracing::info!("Creating admin user: {}", email);
    let user = create_account(&store, email, password, name, UserRole::Admin)
        .await
        .map_err(|e| match e {
            AuthError::UserAlreadyExists => AdminError::UserExists(email.to_owned()),
            other => AdminError::Auth(other),
        })?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );
    Ok(user.id)
}

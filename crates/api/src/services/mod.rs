//! Business logic for the StepUp backend.
//!
//! # Services
//!
//! - `auth` - registration, login and bearer tokens
//! - `catalog` - product CRUD and counts
//! - `cart` - the per-user cart
//! - `checkout` - turning a cart into an order
//! - `payment` - payment proof uploads and review
//! - `storage` - image files on local disk
//!
//! Services are short-lived views over `&dyn Store`, built per request.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod payment;
pub mod storage;

use thiserror::Error;

use stepup_core::MoneyError;

use crate::db::RepositoryError;
use storage::StorageError;

/// Domain failures shared by the catalog, cart, checkout and payment services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Request data failed validation.
    #[error("{0}")]
    InvalidInput(String),

    /// The named entity does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Uniqueness violation, e.g. a duplicate product code.
    #[error("{0}")]
    Conflict(String),

    /// Not enough units on hand for the named product.
    #[error("insufficient stock for {0}")]
    InsufficientStock(String),

    /// The status lifecycle forbids this change.
    #[error("cannot change status from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// The caller may not touch this resource.
    #[error("{0}")]
    Forbidden(String),

    /// Writing or deleting a stored file failed.
    #[error("storage error: {0}")]
    Storage(StorageError),

    /// The store failed.
    #[error("repository error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("record"),
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            RepositoryError::InsufficientStock(id) => Self::InsufficientStock(id.to_string()),
            other => Self::Repository(other),
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io(_) => Self::Storage(err),
            rejected => Self::InvalidInput(rejected.to_string()),
        }
    }
}

impl From<MoneyError> for ServiceError {
    fn from(err: MoneyError) -> Self {
        Self::InvalidInput(format!("price: {err}"))
    }
}

/// Parse a path segment as a typed UUID id.
pub(crate) fn parse_id<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T, ServiceError> {
    raw.parse()
        .map_err(|_| ServiceError::InvalidInput(format!("invalid {what} id")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use stepup_core::ProductId;

    use super::*;

    #[test]
    fn test_repository_errors_map_to_domain() {
        assert!(matches!(
            ServiceError::from(RepositoryError::NotFound),
            ServiceError::NotFound(_)
        ));
        assert!(matches!(
            ServiceError::from(RepositoryError::Conflict("dup".into())),
            ServiceError::Conflict(_)
        ));
        assert!(matches!(
            ServiceError::from(RepositoryError::DataCorruption("bad".into())),
            ServiceError::Repository(_)
        ));
    }

    #[test]
    fn test_storage_rejections_are_invalid_input() {
        let err = ServiceError::from(StorageError::UnsupportedExtension("gif".into()));
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[test]
    fn test_parse_id() {
        let id = ProductId::generate();
        assert_eq!(
            parse_id::<ProductId>(&id.to_string(), "product").unwrap(),
            id
        );
        let err = parse_id::<ProductId>("abc", "product");
        assert!(matches!(err, Err(ServiceError::InvalidInput(msg)) if msg == "invalid product id"));
    }

    #[test]
    fn test_transition_message() {
        let err = ServiceError::InvalidTransition {
            from: "Completed".into(),
            to: "Pending".into(),
        };
        assert_eq!(
            err.to_string(),
            "cannot change status from Completed to Pending"
        );
    }
}

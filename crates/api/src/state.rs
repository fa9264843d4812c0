//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::db::Store;
use crate::services::auth::JwtKeys;
use crate::services::storage::{FileStorage, IMAGE_EXTENSIONS, PAYMENT_EXTENSIONS};

/// URL path that catalog images are served under.
pub const UPLOADS_PATH: &str = "uploads";

/// URL path that payment proofs are served under.
pub const PAYMENT_PATH: &str = "payment";

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the store, token keys, file storage and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    store: Arc<dyn Store>,
    jwt: JwtKeys,
    uploads: FileStorage,
    payments: FileStorage,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - API configuration
    /// * `store` - Persistence backend (`PgStore` in production)
    #[must_use]
    pub fn new(config: ApiConfig, store: Arc<dyn Store>) -> Self {
        let jwt = JwtKeys::new(&config.jwt_secret, config.jwt_ttl);
        let uploads = FileStorage::new(&config.upload_dir, UPLOADS_PATH, IMAGE_EXTENSIONS);
        let payments = FileStorage::new(&config.payment_dir, PAYMENT_PATH, PAYMENT_EXTENSIONS);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                jwt,
                uploads,
                payments,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    #[must_use]
    pub fn jwt(&self) -> &JwtKeys {
        &self.inner.jwt
    }

    /// Storage for catalog images.
    #[must_use]
    pub fn uploads(&self) -> &FileStorage {
        &self.inner.uploads
    }

    /// Storage for payment proofs.
    #[must_use]
    pub fn payments(&self) -> &FileStorage {
        &self.inner.payments
    }
}

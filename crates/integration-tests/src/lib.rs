//! Integration test harness for the StepUp API.
//!
//! Tests drive the full axum `Router` (every middleware layer included) with
//! `tower::ServiceExt::oneshot`. The router is backed by a `MemoryStore` and
//! temporary upload directories, so no database or network is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p stepup-integration-tests
//! ```

#![allow(clippy::missing_panics_doc)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use stepup_api::config::ApiConfig;
use stepup_api::db::MemoryStore;
use stepup_api::services::auth::create_account;
use stepup_api::state::AppState;
use stepup_core::UserRole;

pub const BASE_URL: &str = "http://localhost:3000";
pub const PASSWORD: &str = "s3cure-pass";

const ADMIN_EMAIL: &str = "admin@stepup.id";
const BOUNDARY: &str = "stepup-test-boundary";

/// A decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    /// Parsed JSON, or the raw text as a JSON string when the body is not JSON.
    pub body: Value,
    pub bytes: Vec<u8>,
}

impl TestResponse {
    /// The `data` member of a success envelope.
    #[must_use]
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    /// The `error` member of an error envelope.
    #[must_use]
    pub fn error(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}

/// An application instance with its own store and storage directories.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub upload_dir: TempDir,
    pub payment_dir: TempDir,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        let upload_dir = TempDir::new().expect("create upload dir");
        let payment_dir = TempDir::new().expect("create payment dir");
        let store = Arc::new(MemoryStore::new());

        let config = ApiConfig {
            database_url: SecretString::from("postgres://unused"),
            host: "127.0.0.1".parse().expect("valid ip"),
            port: 3000,
            base_url: BASE_URL.to_string(),
            jwt_secret: SecretString::from("Vq2!mZ7@pR4#tL8&wX1^cN6*bH3%eK9$"),
            jwt_ttl: Duration::from_secs(3600),
            upload_dir: upload_dir.path().to_path_buf(),
            payment_dir: payment_dir.path().to_path_buf(),
            max_upload_bytes: 1024 * 1024,
            request_timeout: Duration::from_secs(10),
            cors_origins: vec!["http://localhost:5173".to_string()],
            rate_limit: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };

        let router = stepup_api::app(AppState::new(config, store.clone()));
        Self {
            router,
            store,
            upload_dir,
            payment_dir,
        }
    }

    /// Send a request with an optional bearer token and JSON body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).expect("valid request")).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    /// Upload one file part under `field`.
    pub async fn upload(
        &self,
        uri: &str,
        token: &str,
        field: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> TestResponse {
        let mut body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("valid request");
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body")
            .to_vec();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        TestResponse {
            status,
            headers,
            body,
            bytes,
        }
    }

    /// Register a customer and return their bearer token.
    pub async fn customer_token(&self, email: &str, name: &str) -> String {
        let registered = self
            .request(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({"email": email, "password": PASSWORD, "name": name})),
            )
            .await;
        assert_eq!(registered.status, StatusCode::CREATED, "{:?}", registered.body);
        self.login(email, PASSWORD).await
    }

    /// Create the admin account directly in the store and log in.
    pub async fn admin_token(&self) -> String {
        create_account(
            self.store.as_ref(),
            ADMIN_EMAIL,
            PASSWORD,
            "Store Admin",
            UserRole::Admin,
        )
        .await
        .expect("create admin");
        self.login(ADMIN_EMAIL, PASSWORD).await
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .request(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({"email": email, "password": password})),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        response.data()["token"]
            .as_str()
            .expect("token in login response")
            .to_string()
    }

    /// Create a product as admin and return its JSON.
    pub async fn create_product(&self, admin: &str, name: &str, price: &str, stock: i64) -> Value {
        let response = self
            .request(
                Method::POST,
                "/api/products",
                Some(admin),
                Some(json!({
                    "name": name,
                    "brand": "StepUp",
                    "category": "running",
                    "color": "black",
                    "price": price,
                    "stock": stock,
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.data().clone()
    }

    /// Current stock of a product, read through the public API.
    pub async fn stock_of(&self, product_id: &str) -> i64 {
        let response = self.get(&format!("/api/products/{product_id}"), None).await;
        response.data()["stock"].as_i64().expect("stock field")
    }

    /// Add to cart and check out, returning the checkout JSON.
    pub async fn place_order(&self, token: &str, product_id: &str, quantity: i64) -> Value {
        let added = self
            .request(
                Method::POST,
                "/api/cart/add",
                Some(token),
                Some(json!({"product_id": product_id, "quantity": quantity})),
            )
            .await;
        assert_eq!(added.status, StatusCode::OK, "{:?}", added.body);

        let placed = self
            .request(
                Method::POST,
                "/api/checkout",
                Some(token),
                Some(json!({
                    "address": "Jl. Asia Afrika 8, Bandung",
                    "phone_number": "+6281234567890",
                })),
            )
            .await;
        assert_eq!(placed.status, StatusCode::CREATED, "{:?}", placed.body);
        placed.data().clone()
    }
}

/// Number of files directly inside `dir`.
#[must_use]
pub fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).map_or(0, Iterator::count)
}

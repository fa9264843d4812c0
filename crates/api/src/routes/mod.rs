//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST   /api/auth/register                - Register a customer
//! POST   /api/auth/login                   - Login, returns {token, role}
//!
//! # Users (admin)
//! GET    /api/users                        - All users
//! GET    /api/users/{id}                   - One user
//!
//! # Catalog
//! GET    /api/products                     - Product listing
//! GET    /api/products/{id}                - Product detail
//! GET    /api/products/code/{code}         - Product by code
//! POST   /api/products                     - Create (admin)
//! PUT    /api/products/{id}                - Update (admin)
//! DELETE /api/products/{id}                - Delete (admin)
//! GET    /api/count/products               - Product count (admin)
//! GET    /api/count/users                  - User count (admin)
//! POST   /api/upload                       - Upload a catalog image (admin)
//!
//! # Cart (user)
//! GET    /api/cart                         - Current cart
//! POST   /api/cart/add                     - Add an item
//! PUT    /api/cart                         - Change a line's quantity
//! DELETE /api/cart/remove-single           - Remove a line
//!
//! # Checkout
//! POST   /api/checkout                     - Place an order (user)
//! GET    /api/checkout                     - Own orders (user)
//! GET    /api/checkout/{checkout_id}       - One order (owner or admin)
//! PUT    /api/checkout/{checkout_id}       - Change status (admin)
//! DELETE /api/checkout/{checkout_id}       - Delete (admin)
//! GET    /api/checkouts                    - All orders (admin)
//!
//! # Payments
//! POST   /api/payment/{checkout_id}        - Upload proof (owner or admin)
//! GET    /api/payment/{checkout_id}        - Latest proof (owner or admin)
//! PUT    /api/payment/{payment_id}/status  - Review (admin)
//! GET    /api/payments                     - All payments (admin)
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod count;
pub mod payment;
pub mod products;
pub mod upload;
pub mod users;

use axum::{
    Json, Router,
    extract::FromRequest,
    routing::{delete, get, post, put},
};
use serde::Serialize;

use crate::error::AppError;
use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Success envelope: `{"success": true, "data": ..., "message"?: ...}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl<T: Serialize> ApiResponse<T> {
    pub const fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
            message: None,
        })
    }

    pub const fn with_message(data: T, message: &'static str) -> Json<Self> {
        Json(Self {
            success: true,
            data,
            message: Some(message),
        })
    }
}

/// `Json` extractor whose rejection is rendered as an `AppError` envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Handler result carrying the success envelope.
pub type ApiResult<T> = crate::error::Result<Json<ApiResponse<T>>>;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::index))
        .route("/{id}", get(users::show))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
        .route("/code/{code}", get(products::show_by_code))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).put(cart::update))
        .route("/add", post(cart::add))
        .route("/remove-single", delete(cart::remove))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(checkout::create).get(checkout::index_mine))
        .route(
            "/{checkout_id}",
            get(checkout::show)
                .put(checkout::update_status)
                .delete(checkout::destroy),
        )
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/{id}", post(payment::upload).get(payment::show))
        .route("/{id}/status", put(payment::update_status))
}

/// Create all `/api` routes.
///
/// Rate limits are skipped when `rate_limit` is false, e.g. in tests that
/// have no client address.
pub fn routes(rate_limit: bool) -> Router<AppState> {
    let mut auth = auth_routes();
    if rate_limit {
        auth = auth.layer(auth_rate_limiter());
    }

    let mut api = Router::new()
        .nest("/users", user_routes())
        .nest("/products", product_routes())
        .route("/count/products", get(count::products))
        .route("/count/users", get(count::users))
        .route("/upload", post(upload::image))
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .route("/checkouts", get(checkout::index_all))
        .nest("/payment", payment_routes())
        .route("/payments", get(payment::index_all));
    if rate_limit {
        api = api.layer(api_rate_limiter());
    }

    Router::new().nest("/api", api.nest("/auth", auth))
}

//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. Request ID (add unique ID to each request)
//! 3. `TraceLayer` (request tracing)
//! 4. Timeout
//! 5. CORS
//! 6. Security headers
//! 7. Body limit
//!
//! Rate limiting (governor) is applied per route group.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use auth::{RequireAdmin, RequireAuth};
pub use rate_limit::{api_rate_limiter, auth_rate_limiter};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use security_headers::security_headers_middleware;

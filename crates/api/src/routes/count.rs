//! Dashboard counters.

use axum::extract::State;
use serde::Serialize;

use super::{ApiResponse, ApiResult};
use crate::middleware::RequireAdmin;
use crate::services::catalog::CatalogService;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProductCount {
    pub product_count: i64,
}

#[derive(Debug, Serialize)]
pub struct UserCount {
    pub user_count: i64,
}

/// GET /api/count/products
pub async fn products(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> ApiResult<ProductCount> {
    let product_count = CatalogService::new(state.store()).count_products().await?;
    Ok(ApiResponse::ok(ProductCount { product_count }))
}

/// GET /api/count/users
pub async fn users(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> ApiResult<UserCount> {
    let user_count = CatalogService::new(state.store()).count_users().await?;
    Ok(ApiResponse::ok(UserCount { user_count }))
}

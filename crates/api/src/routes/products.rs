//! Catalog routes. Reads are public, writes need an admin token.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use super::{ApiJson, ApiResponse, ApiResult};
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::{Product, ProductInput};
use crate::services::catalog::CatalogService;
use crate::services::parse_id;
use crate::state::AppState;

/// GET /api/products
pub async fn index(State(state): State<AppState>) -> ApiResult<Vec<Product>> {
    let products = CatalogService::new(state.store()).list().await?;
    Ok(ApiResponse::ok(products))
}

/// GET /api/products/{id}
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Product> {
    let id = parse_id(&id, "product")?;
    let product = CatalogService::new(state.store()).get(id).await?;
    Ok(ApiResponse::ok(product))
}

/// GET /api/products/code/{code}
pub async fn show_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Product> {
    let product = CatalogService::new(state.store()).get_by_code(&code).await?;
    Ok(ApiResponse::ok(product))
}

/// POST /api/products
#[tracing::instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<(StatusCode, Json<ApiResponse<Product>>)> {
    let product = CatalogService::new(state.store()).create(input).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(product, "Product created successfully"),
    ))
}

/// PUT /api/products/{id}
#[tracing::instrument(skip_all)]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ProductInput>,
) -> ApiResult<Product> {
    let id = parse_id(&id, "product")?;
    let product = CatalogService::new(state.store()).update(id, input).await?;
    Ok(ApiResponse::with_message(product, "Product updated successfully"))
}

/// DELETE /api/products/{id}
#[tracing::instrument(skip_all)]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = parse_id(&id, "product")?;
    CatalogService::new(state.store()).delete(id).await?;
    Ok(ApiResponse::with_message((), "Product deleted successfully"))
}

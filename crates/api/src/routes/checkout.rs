//! Checkout routes.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use super::{ApiJson, ApiResponse, ApiResult};
use crate::error::Result;
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::Checkout;
use crate::services::checkout::CheckoutService;
use crate::services::parse_id;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCheckoutRequest {
    pub address: String,
    pub phone_number: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

/// POST /api/checkout
#[tracing::instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiJson(body): ApiJson<CreateCheckoutRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Checkout>>)> {
    let checkout = CheckoutService::new(state.store())
        .create(caller.id, &body.address, &body.phone_number)
        .await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(checkout, "Checkout created"),
    ))
}

/// GET /api/checkout
pub async fn index_mine(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> ApiResult<Vec<Checkout>> {
    let checkouts = CheckoutService::new(state.store())
        .list_for_user(caller.id)
        .await?;
    Ok(ApiResponse::ok(checkouts))
}

/// GET /api/checkouts
pub async fn index_all(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> ApiResult<Vec<Checkout>> {
    let checkouts = CheckoutService::new(state.store()).list_all().await?;
    Ok(ApiResponse::ok(checkouts))
}

/// GET /api/checkout/{checkout_id}
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Path(checkout_id): Path<String>,
) -> ApiResult<Checkout> {
    let id = parse_id(&checkout_id, "checkout")?;
    let checkout = CheckoutService::new(state.store()).get(id, caller).await?;
    Ok(ApiResponse::ok(checkout))
}

/// PUT /api/checkout/{checkout_id}
#[tracing::instrument(skip_all)]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(checkout_id): Path<String>,
    ApiJson(body): ApiJson<StatusRequest>,
) -> ApiResult<Checkout> {
    let id = parse_id(&checkout_id, "checkout")?;
    let checkout = CheckoutService::new(state.store())
        .update_status(id, &body.status)
        .await?;
    Ok(ApiResponse::with_message(checkout, "Checkout status updated"))
}

/// DELETE /api/checkout/{checkout_id}
#[tracing::instrument(skip_all)]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(checkout_id): Path<String>,
) -> ApiResult<()> {
    let id = parse_id(&checkout_id, "checkout")?;
    CheckoutService::new(state.store()).delete(id).await?;
    Ok(ApiResponse::with_message((), "Checkout deleted"))
}

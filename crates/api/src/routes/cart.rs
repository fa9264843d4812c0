//! Cart routes. All require a bearer token and act on the caller's own cart.

use axum::extract::State;
use serde::Deserialize;

use stepup_core::ProductId;

use super::{ApiJson, ApiResponse, ApiResult};
use crate::middleware::RequireAuth;
use crate::models::{Cart, CartView};
use crate::services::cart::CartService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CartLineRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct RemoveLineRequest {
    pub product_id: ProductId,
}

/// GET /api/cart
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> ApiResult<CartView> {
    let cart = CartService::new(state.store()).get_cart(caller.id).await?;
    Ok(ApiResponse::ok(cart))
}

/// POST /api/cart/add
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiJson(body): ApiJson<CartLineRequest>,
) -> ApiResult<Cart> {
    let cart = CartService::new(state.store())
        .add_item(caller.id, body.product_id, body.quantity)
        .await?;
    Ok(ApiResponse::with_message(cart, "Item added to cart"))
}

/// PUT /api/cart
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiJson(body): ApiJson<CartLineRequest>,
) -> ApiResult<Cart> {
    let cart = CartService::new(state.store())
        .update_quantity(caller.id, body.product_id, body.quantity)
        .await?;
    Ok(ApiResponse::with_message(cart, "Item updated"))
}

/// DELETE /api/cart/remove-single
///
/// `data` is `null` once the last line is gone and the cart deleted.
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiJson(body): ApiJson<RemoveLineRequest>,
) -> ApiResult<Option<Cart>> {
    let cart = CartService::new(state.store())
        .remove_item(caller.id, body.product_id)
        .await?;
    Ok(ApiResponse::with_message(cart, "Item removed from cart"))
}

//! Payment proof routes.

use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, Path, State},
    http::StatusCode,
};

use super::checkout::StatusRequest;
use super::upload::read_file_field;
use super::{ApiJson, ApiResponse, ApiResult};
use crate::error::Result;
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::Payment;
use crate::services::parse_id;
use crate::services::payment::PaymentService;
use crate::state::AppState;

fn service(state: &AppState) -> PaymentService<'_> {
    PaymentService::new(state.store(), state.payments(), &state.config().base_url)
}

/// POST /api/payment/{checkout_id}
///
/// Multipart body with the proof in the `payment_image` field.
#[tracing::instrument(skip_all)]
pub async fn upload(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Path(checkout_id): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<Payment>>)> {
    let checkout_id = parse_id(&checkout_id, "checkout")?;
    let part = read_file_field(&mut multipart, "payment_image").await?;
    let (file_name, bytes) = match part {
        Some(p) => (p.file_name, p.bytes),
        None => (None, Bytes::new()),
    };

    let payment = service(&state)
        .save_proof(checkout_id, caller, file_name.as_deref(), &bytes)
        .await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(payment, "Payment proof saved"),
    ))
}

/// GET /api/payment/{checkout_id}
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Path(checkout_id): Path<String>,
) -> ApiResult<Payment> {
    let checkout_id = parse_id(&checkout_id, "checkout")?;
    let payment = service(&state)
        .latest_for_checkout(checkout_id, caller)
        .await?;
    Ok(ApiResponse::ok(payment))
}

/// PUT /api/payment/{payment_id}/status
#[tracing::instrument(skip_all)]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(payment_id): Path<String>,
    ApiJson(body): ApiJson<StatusRequest>,
) -> ApiResult<Payment> {
    let id = parse_id(&payment_id, "payment")?;
    let payment = service(&state).update_status(id, &body.status).await?;
    Ok(ApiResponse::with_message(payment, "Payment status updated"))
}

/// GET /api/payments
pub async fn index_all(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> ApiResult<Vec<Payment>> {
    let payments = service(&state).list_all().await?;
    Ok(ApiResponse::ok(payments))
}

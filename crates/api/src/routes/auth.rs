//! Registration and login.

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;

use super::{ApiJson, ApiResponse, ApiResult};
use crate::models::User;
use crate::services::auth::{AuthService, LoginResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/auth/register
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> crate::error::Result<(StatusCode, axum::Json<ApiResponse<User>>)> {
    let auth = AuthService::new(state.store(), state.jwt());
    let user = auth.register(&body.email, &body.password, &body.name).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(user, "User registered successfully"),
    ))
}

/// POST /api/auth/login
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let auth = AuthService::new(state.store(), state.jwt());
    let session = auth.login(&body.email, &body.password).await?;
    Ok(ApiResponse::with_message(session, "Login successful"))
}

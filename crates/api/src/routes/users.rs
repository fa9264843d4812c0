//! User administration.

use axum::extract::{Path, State};

use super::{ApiResponse, ApiResult};
use crate::middleware::RequireAdmin;
use crate::models::User;
use crate::services::auth::AuthService;
use crate::services::parse_id;
use crate::state::AppState;

/// GET /api/users
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> ApiResult<Vec<User>> {
    let users = AuthService::new(state.store(), state.jwt())
        .list_users()
        .await?;
    Ok(ApiResponse::ok(users))
}

/// GET /api/users/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<String>,
) -> ApiResult<User> {
    let id = parse_id(&id, "user")?;
    let user = AuthService::new(state.store(), state.jwt())
        .get_user(id)
        .await?;
    Ok(ApiResponse::ok(user))
}

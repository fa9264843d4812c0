//! Bearer token extractors.
//!
//! Handlers declare the access they need in their signature:
//!
//! ```rust,ignore
//! async fn my_cart(RequireAuth(caller): RequireAuth) -> Result<Json<..>> { .. }
//! async fn all_users(RequireAdmin(_): RequireAdmin) -> Result<Json<..>> { .. }
//! ```

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::services::auth::AuthUser;
use crate::state::AppState;

/// Extractor that requires a valid `Authorization: Bearer <jwt>` header.
///
/// Rejects with 401 if the header is missing, malformed or the token does not
/// verify.
pub struct RequireAuth(pub AuthUser);

/// Extractor that requires a valid token carrying the admin role.
///
/// Rejects with 401 like [`RequireAuth`], then 403 for non-admins.
pub struct RequireAdmin(pub AuthUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let token = bearer_token(parts)?;

        let user = state.jwt().verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            AppError::Unauthorized("Invalid or expired token".to_string())
        })?;

        set_sentry_user(&user.id);
        Ok(Self(user))
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        Ok(Self(user))
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;

    header
        .to_str()
        .ok()
        .and_then(|v| {
            v.strip_prefix("Bearer ")
                .or_else(|| v.strip_prefix("bearer "))
        })
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Malformed authorization header".to_string()))
}

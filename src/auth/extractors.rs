use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use super::jwt::JwtKeys;
use crate::{error::AppError, policy::Principal, state::AppState};

/// Authenticated caller. Roles are read from the directory on every request
/// so membership edits apply without re-issuing tokens.
pub struct AuthUser(pub Principal);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let claims = JwtKeys::from_ref(state).verify_access(token).map_err(|e| {
            warn!(error = %e, "rejected bearer token");
            AppError::Unauthorized("Invalid or expired token".into())
        })?;

        if state.users.find_by_id(claims.sub).await?.is_none() {
            warn!(user_id = %claims.sub, "token for unknown user");
            return Err(AppError::Unauthorized("User not found".into()));
        }
        let roles = state.users.roles_of(claims.sub).await?;

        Ok(AuthUser(Principal::new(claims.sub, roles)))
    }
}

/// Authenticated caller holding the `Admin` role.
pub struct AdminUser(pub Principal);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(principal) = AuthUser::from_request_parts(parts, state).await?;
        if !principal.is_admin() {
            warn!(user_id = %principal.id, "admin area denied");
            return Err(AppError::Forbidden);
        }
        Ok(AdminUser(principal))
    }
}

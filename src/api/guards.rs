use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::{security, state::AppState};
use crate::services::permissions::{self, Permission, Role};

/// Identity taken from a verified bearer token. The role is the raw claim;
/// nothing is granted until [`require_permission`] has checked it.
#[derive(Debug, Clone)]
pub(crate) struct CurrentUser {
    pub(crate) id: String,
    pub(crate) role: String,
}

/// A caller that passed the permission gate for the current operation.
#[derive(Debug, Clone)]
pub(crate) struct Caller {
    pub(crate) id: String,
    pub(crate) role: Role,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let claims = security::verify_token(token, state.settings())
            .map_err(|_| ApiError::Unauthorized("Invalid authentication credentials"))?;

        if claims.sub.trim().is_empty() {
            return Err(ApiError::Unauthorized("Invalid authentication credentials"));
        }

        Ok(CurrentUser { id: claims.sub, role: claims.role })
    }
}

pub(crate) fn require_permission(
    user: &CurrentUser,
    permission: Permission,
) -> Result<Caller, ApiError> {
    if !permissions::has_permission(&user.role, permission) {
        tracing::warn!(
            user_id = %user.id,
            role = %user.role,
            permission = %permission,
            "Permission denied"
        );
        return Err(ApiError::Forbidden("Insufficient permissions"));
    }

    let role = user.role.parse::<Role>().map_err(|_| ApiError::Forbidden("Insufficient permissions"))?;
    Ok(Caller { id: user.id.clone(), role })
}

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::http::error::ApiError;
use crate::http::AppState;

/// Identity of the caller, extracted from the bearer access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("missing authorization header".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("invalid authorization header".to_string()))?;

        let claims = state
            .tokens
            .decode_access(token)
            .map_err(|_| ApiError::Unauthorized("invalid or expired token".to_string()))?;

        let id = claims
            .user_id()
            .map_err(|_| ApiError::Unauthorized("invalid token subject".to_string()))?;

        Ok(AuthUser {
            id,
            username: claims.username,
        })
    }
}

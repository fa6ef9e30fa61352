use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::auth::password;
use crate::db::{ChatStore, UsernameTaken};
use crate::http::dto::{
    AuthResponse, LoginRequest, RefreshRequest, RefreshResponse, RegisterRequest, UserResponse,
};
use crate::http::error::ApiError;
use crate::http::extract::AuthUser;
use crate::http::AppState;

/// POST /api/auth/register/
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    req.validate()?;

    let username = req.username.trim();
    if state.db.get_user_by_username(username).await?.is_some() {
        return Err(ApiError::field(
            "username",
            "A user with that username already exists.",
        ));
    }

    let password_hash = password::hash_password(&req.password)?;
    let user = match state
        .db
        .create_user(
            username,
            &req.email,
            &req.first_name,
            &req.last_name,
            &password_hash,
        )
        .await
    {
        Ok(user) => user,
        // A concurrent registration can slip past the lookup above and land
        // on the unique constraint instead.
        Err(e) if e.downcast_ref::<UsernameTaken>().is_some() => {
            return Err(ApiError::field(
                "username",
                "A user with that username already exists.",
            ));
        }
        Err(e) => return Err(e.into()),
    };

    // Default settings row is created alongside the account
    state.db.get_or_create_settings(user.id).await?;

    let access = state.tokens.issue_access(user.id, &user.username)?;
    let refresh = state.tokens.issue_refresh(user.id, &user.username)?;

    tracing::info!("registered user {}", user.username);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserResponse::from(&user),
            access,
            refresh,
        }),
    ))
}

/// POST /api/auth/login/
///
/// Unknown username and wrong password are indistinguishable to the caller.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = state
        .db
        .get_user_by_username(req.username.trim())
        .await?
        .ok_or_else(|| ApiError::Unauthorized("invalid credentials".to_string()))?;

    if !password::verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::Unauthorized("invalid credentials".to_string()));
    }

    let access = state.tokens.issue_access(user.id, &user.username)?;
    let refresh = state.tokens.issue_refresh(user.id, &user.username)?;

    Ok(Json(AuthResponse {
        user: UserResponse::from(&user),
        access,
        refresh,
    }))
}

/// POST /api/auth/refresh/
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let access = state
        .tokens
        .refresh_access(&req.refresh)
        .map_err(|_| ApiError::Unauthorized("invalid or expired refresh token".to_string()))?;

    Ok(Json(RefreshResponse { access }))
}

/// GET /api/auth/user/
pub async fn current_user(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .db
        .get_user_by_id(auth.id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("user no longer exists".to_string()))?;

    Ok(Json(UserResponse::from(&user)))
}

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::db::models::is_valid_theme;
use crate::db::ChatStore;
use crate::http::dto::{SettingsResponse, UpdateSettingsRequest};
use crate::http::error::ApiError;
use crate::http::extract::AuthUser;
use crate::http::AppState;

/// GET /api/settings/ — creates a default row on first access.
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<SettingsResponse>, ApiError> {
    let settings = state.db.get_or_create_settings(auth.id).await?;
    Ok(Json(SettingsResponse::from(&settings)))
}

/// PUT /api/settings/
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<UpdateSettingsRequest>,
) -> Result<Json<SettingsResponse>, ApiError> {
    if !is_valid_theme(&req.theme) {
        return Err(ApiError::field("theme", "theme must be 'light' or 'dark'"));
    }

    let settings = state.db.update_theme(auth.id, &req.theme).await?;
    Ok(Json(SettingsResponse::from(&settings)))
}

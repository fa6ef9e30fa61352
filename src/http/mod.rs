pub mod auth;
pub mod chats;
pub mod dto;
pub mod error;
pub mod extract;
pub mod settings;


use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::ai::llm::InferenceClient;
use crate::auth::jwt::TokenIssuer;
use crate::config::AppConfig;
use crate::db::ChatStore;

/// Shared application state, accessible from all handlers.
pub struct AppState {
    pub config: AppConfig,
    pub db: Arc<dyn ChatStore>,
    pub llm: Arc<dyn InferenceClient>,
    pub tokens: TokenIssuer,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        // Auth
        .route("/api/auth/register/", post(auth::register))
        .route("/api/auth/login/", post(auth::login))
        .route("/api/auth/refresh/", post(auth::refresh))
        .route("/api/auth/user/", get(auth::current_user))
        // Chats
        .route(
            "/api/chats/",
            get(chats::list_chats).post(chats::create_chat),
        )
        .route("/api/chats/history/", get(chats::list_chats))
        .route(
            "/api/chats/{id}/",
            get(chats::get_chat)
                .put(chats::update_chat)
                .patch(chats::update_chat)
                .delete(chats::delete_chat),
        )
        .route("/api/chats/{id}/send_message/", post(chats::send_message))
        .route(
            "/api/chats/{id}/delete_last_assistant_message/",
            delete(chats::delete_last_assistant_message),
        )
        // Settings
        .route(
            "/api/settings/",
            get(settings::get_settings).put(settings::update_settings),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.cors_allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::ai::llm::{ChatMessage, InferenceClient};
use crate::db::models::{ROLE_ASSISTANT, ROLE_USER};
use crate::db::ChatStore;
use crate::http::dto::{
    ChatDetail, ChatListItem, CreateChatRequest, DeleteMessageResponse, LastMessagePreview,
    MessageResponse, SendMessageRequest, SendMessageResponse, UpdateChatRequest,
};
use crate::http::error::ApiError;
use crate::http::extract::AuthUser;
use crate::http::AppState;

/// GET /api/chats/ and GET /api/chats/history/
pub async fn list_chats(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<ChatListItem>>, ApiError> {
    let chats = state.db.list_chats(auth.id).await?;

    let mut items = Vec::with_capacity(chats.len());
    for chat in &chats {
        let message_count = state.db.count_messages(chat.id).await?;
        let last_message = state
            .db
            .last_message(chat.id)
            .await?
            .map(|m| LastMessagePreview::from(&m));

        items.push(ChatListItem {
            id: chat.id,
            title: chat.title.clone(),
            created_at: chat.created_at,
            updated_at: chat.updated_at,
            message_count,
            last_message,
        });
    }

    Ok(Json(items))
}

/// POST /api/chats/
pub async fn create_chat(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<CreateChatRequest>,
) -> Result<(StatusCode, Json<ChatDetail>), ApiError> {
    // Blank titles fall back to the column default
    let title = req
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let chat = state.db.create_chat(auth.id, title).await?;

    Ok((StatusCode::CREATED, Json(ChatDetail::new(&chat, &[]))))
}

/// GET /api/chats/{id}/
pub async fn get_chat(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ChatDetail>, ApiError> {
    let chat = state
        .db
        .get_chat(id, auth.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("chat not found".to_string()))?;

    let messages = state.db.get_messages(chat.id).await?;

    Ok(Json(ChatDetail::new(&chat, &messages)))
}

/// PUT/PATCH /api/chats/{id}/ — rename the chat.
pub async fn update_chat(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateChatRequest>,
) -> Result<Json<ChatDetail>, ApiError> {
    let chat = state
        .db
        .get_chat(id, auth.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("chat not found".to_string()))?;

    let title = req.title.trim();
    if title.is_empty() {
        return Err(ApiError::field("title", "This field may not be blank."));
    }

    state.db.update_chat_title(chat.id, title).await?;

    let chat = state
        .db
        .get_chat(id, auth.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("chat not found".to_string()))?;
    let messages = state.db.get_messages(chat.id).await?;

    Ok(Json(ChatDetail::new(&chat, &messages)))
}

/// DELETE /api/chats/{id}/
pub async fn delete_chat(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deleted = state.db.delete_chat(id, auth.id).await?;
    if !deleted {
        return Err(ApiError::NotFound("chat not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/chats/{id}/send_message/
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, ApiError> {
    let chat = state
        .db
        .get_chat(id, auth.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("chat not found".to_string()))?;

    let user_text = req.message.trim();
    if user_text.is_empty() {
        return Err(ApiError::BadRequest("Message cannot be empty".to_string()));
    }

    // ── 1. Save user message ───────────────────────────────────────

    let user_msg = state.db.save_message(chat.id, ROLE_USER, user_text).await?;

    // ── 2. Build conversation history for the model ────────────────

    let history = state.db.get_messages(chat.id).await?;
    let turns: Vec<ChatMessage> = history
        .iter()
        .map(|m| ChatMessage {
            role: m.role.clone(),
            content: m.content.clone(),
        })
        .collect();

    // ── 3. Call the inference endpoint ─────────────────────────────
    //
    // The user message above stays persisted even when this fails;
    // there is no transaction around the pair.

    let reply = state.llm.chat(&turns).await.map_err(ApiError::Upstream)?;

    // ── 4. Save assistant message ──────────────────────────────────

    let assistant_msg = state
        .db
        .save_message(chat.id, ROLE_ASSISTANT, &reply)
        .await?;

    // ── 5. Title the chat after its first exchange ─────────────────

    if state.db.count_messages(chat.id).await? == 2 {
        state
            .db
            .update_chat_title(chat.id, &derive_title(user_text))
            .await?;
    }

    let chat = state
        .db
        .get_chat(id, auth.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("chat not found".to_string()))?;
    let messages = state.db.get_messages(chat.id).await?;

    Ok(Json(SendMessageResponse {
        user_message: MessageResponse::from(&user_msg),
        assistant_message: MessageResponse::from(&assistant_msg),
        chat: ChatDetail::new(&chat, &messages),
    }))
}

/// DELETE /api/chats/{id}/delete_last_assistant_message/
///
/// Removes the newest assistant reply so the client can regenerate it.
pub async fn delete_last_assistant_message(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteMessageResponse>, ApiError> {
    let chat = state
        .db
        .get_chat(id, auth.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("chat not found".to_string()))?;

    let deleted_id = state
        .db
        .delete_last_assistant_message(chat.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("no assistant message found".to_string()))?;

    let chat = state
        .db
        .get_chat(id, auth.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("chat not found".to_string()))?;
    let messages = state.db.get_messages(chat.id).await?;

    Ok(Json(DeleteMessageResponse {
        message: format!("Message {deleted_id} deleted successfully"),
        chat: ChatDetail::new(&chat, &messages),
    }))
}

/// First 50 chars of the opening message, with an ellipsis when truncated.
fn derive_title(message: &str) -> String {
    let mut title: String = message.chars().take(50).collect();
    if message.chars().count() > 50 {
        title.push_str("...");
    }
    title
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_message_becomes_the_title_verbatim() {
        assert_eq!(derive_title("hello"), "hello");
    }

    #[test]
    fn long_message_is_truncated_with_ellipsis() {
        let msg = "a".repeat(60);
        let title = derive_title(&msg);
        assert_eq!(title.len(), 53);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn exactly_50_chars_is_not_truncated() {
        let msg = "b".repeat(50);
        assert_eq!(derive_title(&msg), msg);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let msg = "é".repeat(60);
        let title = derive_title(&msg);
        assert_eq!(title.chars().count(), 53);
    }
}

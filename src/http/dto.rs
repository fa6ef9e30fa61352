use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::{Chat, Message, User, UserSettings};
use crate::http::error::ApiError;

// ── Requests ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password: String,
    pub password2: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = std::collections::BTreeMap::new();

        if self.username.trim().is_empty() {
            errors.insert("username", vec!["This field may not be blank.".to_string()]);
        }
        if self.password.is_empty() {
            errors.insert("password", vec!["This field may not be blank.".to_string()]);
        } else if self.password != self.password2 {
            errors.insert(
                "password",
                vec!["Password fields didn't match.".to_string()],
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateChatRequest {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateChatRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    pub theme: String,
}

// ── Responses ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&User> for UserResponse {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            email: u.email.clone(),
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: Uuid,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Message> for MessageResponse {
    fn from(m: &Message) -> Self {
        Self {
            id: m.id,
            role: m.role.clone(),
            content: m.content.clone(),
            created_at: m.created_at,
        }
    }
}

/// Truncated preview of the newest message in a chat list item.
#[derive(Debug, Serialize)]
pub struct LastMessagePreview {
    pub content: String,
    pub role: String,
}

impl From<&Message> for LastMessagePreview {
    fn from(m: &Message) -> Self {
        Self {
            content: m.content.chars().take(50).collect(),
            role: m.role.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatListItem {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: i64,
    pub last_message: Option<LastMessagePreview>,
}

#[derive(Debug, Serialize)]
pub struct ChatDetail {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub messages: Vec<MessageResponse>,
    pub message_count: i64,
}

impl ChatDetail {
    pub fn new(chat: &Chat, messages: &[Message]) -> Self {
        Self {
            id: chat.id,
            title: chat.title.clone(),
            created_at: chat.created_at,
            updated_at: chat.updated_at,
            messages: messages.iter().map(MessageResponse::from).collect(),
            message_count: messages.len() as i64,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub user_message: MessageResponse,
    pub assistant_message: MessageResponse,
    pub chat: ChatDetail,
}

#[derive(Debug, Serialize)]
pub struct DeleteMessageResponse {
    pub message: String,
    pub chat: ChatDetail,
}

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub theme: String,
    pub updated_at: DateTime<Utc>,
}

impl From<&UserSettings> for SettingsResponse {
    fn from(s: &UserSettings) -> Self {
        Self {
            theme: s.theme.clone(),
            updated_at: s.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_req(password: &str, password2: &str) -> RegisterRequest {
        RegisterRequest {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: password.to_string(),
            password2: password2.to_string(),
            first_name: String::new(),
            last_name: String::new(),
        }
    }

    #[test]
    fn register_accepts_matching_passwords() {
        assert!(register_req("pw", "pw").validate().is_ok());
    }

    #[test]
    fn register_rejects_mismatched_passwords() {
        let err = register_req("pw", "other").validate().unwrap_err();
        match err {
            ApiError::Validation(map) => assert!(map.contains_key("password")),
            _ => panic!("expected validation error"),
        }
    }

    #[test]
    fn register_rejects_blank_username() {
        let mut req = register_req("pw", "pw");
        req.username = "  ".to_string();
        let err = req.validate().unwrap_err();
        match err {
            ApiError::Validation(map) => assert!(map.contains_key("username")),
            _ => panic!("expected validation error"),
        }
    }

    #[test]
    fn register_rejects_blank_password() {
        let err = register_req("", "").validate().unwrap_err();
        match err {
            ApiError::Validation(map) => assert!(map.contains_key("password")),
            _ => panic!("expected validation error"),
        }
    }

    #[test]
    fn user_response_omits_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: "$argon2id$...".to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(UserResponse::from(&user)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "alice");
    }

    #[test]
    fn last_message_preview_truncates_to_50_chars() {
        let msg = Message {
            id: Uuid::new_v4(),
            chat_id: Uuid::new_v4(),
            role: "assistant".to_string(),
            content: "x".repeat(80),
            created_at: Utc::now(),
        };
        let preview = LastMessagePreview::from(&msg);
        assert_eq!(preview.content.chars().count(), 50);
    }
}

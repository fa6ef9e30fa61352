use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

const API_URL: &str = "https://router.huggingface.co/v1/chat/completions";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const SYSTEM_PROMPT: &str = "You are a helpful assistant chatbot. Be concise, \
clear, and accurate. If you don't have enough information, say so rather than \
guessing.";

#[derive(Debug, Clone, Serialize)]
struct HfMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct HfResponse {
    choices: Vec<HfChoice>,
}

#[derive(Debug, Deserialize)]
struct HfChoice {
    message: HfMessageContent,
}

#[derive(Debug, Deserialize)]
struct HfMessageContent {
    content: String,
}

/// A simple (role, content) pair for building the messages array.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// The inference endpoint as the rest of the app sees it: a conversation in,
/// the assistant's reply out.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn chat(&self, messages: &[ChatMessage]) -> anyhow::Result<String>;
}

pub struct LlmClient {
    client: Client,
    api_key: String,
    model: String,
}

impl LlmClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.hf_api_key.clone(),
            model: config.hf_model.clone(),
        }
    }
}

#[async_trait]
impl InferenceClient for LlmClient {
    /// Send a conversation to the Hugging Face router and get the assistant's
    /// reply. The static system prompt is prepended to every request.
    async fn chat(&self, messages: &[ChatMessage]) -> anyhow::Result<String> {
        let hf_messages = with_system_prompt(messages);

        let body = serde_json::json!({
            "model": self.model,
            "messages": hf_messages,
            "max_tokens": 2048,
            "temperature": 0.7,
            "top_p": 0.9,
            "stream": false,
        });

        let resp = self
            .client
            .post(API_URL)
            .timeout(REQUEST_TIMEOUT)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let err_body = resp.text().await.unwrap_or_default();
            anyhow::bail!("inference API error ({}): {}", status, err_body);
        }

        let hf_resp: HfResponse = resp.json().await?;

        let text = hf_resp
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| anyhow::anyhow!("inference response contained no choices"))?;

        Ok(clean_markdown(&text))
    }
}

fn with_system_prompt(messages: &[ChatMessage]) -> Vec<HfMessage> {
    let mut out = Vec::with_capacity(messages.len() + 1);
    out.push(HfMessage {
        role: "system".to_string(),
        content: SYSTEM_PROMPT.to_string(),
    });
    for m in messages {
        out.push(HfMessage {
            role: m.role.clone(),
            content: m.content.clone(),
        });
    }
    out
}

static MD_HEADERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#+\s*").expect("static regex"));
static MD_BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("static regex"));
static MD_ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*]+)\*").expect("static regex"));

/// Strip markdown header/bold/italic markers from model replies.
pub fn clean_markdown(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }

    let content = MD_HEADERS.replace_all(content, "");
    let content = MD_BOLD.replace_all(&content, "$1");
    let content = MD_ITALIC.replace_all(&content, "$1");
    let content = content.replace("**", "");

    content.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_comes_first() {
        let turns = vec![
            ChatMessage {
                role: "user".to_string(),
                content: "hello".to_string(),
            },
            ChatMessage {
                role: "assistant".to_string(),
                content: "hi there".to_string(),
            },
        ];
        let msgs = with_system_prompt(&turns);
        assert_eq!(msgs.len(), 3);
        assert_eq!(msgs[0].role, "system");
        assert_eq!(msgs[1].content, "hello");
        assert_eq!(msgs[2].role, "assistant");
    }

    #[test]
    fn parses_chat_completions_response() {
        let raw = r#"{
            "id": "cmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "hi there"}}
            ],
            "usage": {"prompt_tokens": 10, "completion_tokens": 3, "total_tokens": 13}
        }"#;
        let resp: HfResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.choices[0].message.content, "hi there");
    }

    #[test]
    fn response_without_choices_parses_to_empty() {
        let resp: HfResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(resp.choices.is_empty());
    }

    #[test]
    fn clean_markdown_strips_headers_and_emphasis() {
        let raw = "# Heading\nSome **bold** and *italic* text.";
        assert_eq!(clean_markdown(raw), "Heading\nSome bold and italic text.");
    }

    #[test]
    fn clean_markdown_leaves_plain_text_alone() {
        assert_eq!(clean_markdown("2 x 3 = 6"), "2 x 3 = 6");
        assert_eq!(clean_markdown(""), "");
    }
}

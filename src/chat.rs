//! Chat Completions with caller-carried history.

use std::fs;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::config::Settings;
use crate::error::{AdapterError, Result};
use crate::http;

const TEMPERATURE: f64 = 0.7;
// Replaces the system prompt in returned history
const BLANK_PROMPT: &str = " ";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: Value,
}

impl ChatMessage {
    pub fn new(role: &str, content: impl Into<String>) -> Self {
        ChatMessage {
            role: role.to_string(),
            content: Value::String(content.into()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(rename = "xOpenAPIKey", default)]
    pub api_key: Option<String>,
    #[serde(rename = "chatGPTModel", default)]
    pub model: Option<String>,
    #[serde(rename = "historyJson", default)]
    pub history_json: Option<String>,
    #[serde(rename = "addPromptHistory", default)]
    pub add_prompt_history: Option<String>,
    #[serde(rename = "userMessage", default)]
    pub user_message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    #[serde(rename = "assistantMessage")]
    pub assistant_message: String,
    #[serde(rename = "updatedHistoryJson")]
    pub updated_history_json: String,
}

pub fn load_system_prompt(path: &str) -> String {
    match fs::read_to_string(path) {
        Ok(prompt) => {
            info!(path, "system prompt loaded");
            prompt
        }
        Err(e) => {
            warn!(path, error = %e, "system prompt unavailable, using blank prompt");
            BLANK_PROMPT.to_string()
        }
    }
}

/// Blank history yields no messages; a JSON value that is not an array is ignored.
pub fn parse_history(history_json: Option<&str>) -> Result<Vec<ChatMessage>> {
    let raw = match history_json.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Ok(Vec::new()),
    };
    let parsed: Value = serde_json::from_str(raw).map_err(|_| {
        AdapterError::invalid_input("historyJson must be a JSON string of a message array")
    })?;
    if !parsed.is_array() {
        return Ok(Vec::new());
    }
    serde_json::from_value(parsed).map_err(|_| {
        AdapterError::invalid_input("historyJson entries must carry role and content")
    })
}

pub fn build_messages(
    system_prompt: &str,
    mut history: Vec<ChatMessage>,
    add_prompt_history: Option<&str>,
    user_message: &str,
) -> Vec<ChatMessage> {
    if let Some(extra) = add_prompt_history.map(str::trim).filter(|s| !s.is_empty()) {
        history.push(ChatMessage::new("user", extra));
    }
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::new("system", system_prompt));
    messages.extend(history);
    messages.push(ChatMessage::new("user", user_message));
    messages
}

/// Conversation to hand back: `messages` plus the reply, with the system prompt blanked.
pub fn updated_history(mut messages: Vec<ChatMessage>, reply: &str) -> Vec<ChatMessage> {
    messages.push(ChatMessage::new("assistant", reply));
    if let Some(first) = messages.first_mut() {
        if first.role == "system" {
            first.content = Value::String(BLANK_PROMPT.to_string());
        }
    }
    messages
}

pub fn completion_text(body: &Value) -> Result<String> {
    body.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AdapterError::malformed("completion has no choices[0].message.content"))
}

pub async fn chat_handler(settings: &Settings, client: &Client, request: ChatRequest) -> Result<ChatResponse> {
    let api_key = request
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| AdapterError::invalid_input("OpenAI API key (xOpenAPIKey) not provided"))?;
    let model = request
        .model
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(settings.chat_default_model.as_str())
        .to_string();

    let system_prompt = load_system_prompt(&settings.system_prompt_path);
    let history = parse_history(request.history_json.as_deref())?;
    let messages = build_messages(
        &system_prompt,
        history,
        request.add_prompt_history.as_deref(),
        &request.user_message,
    );
    info!(model = %model, messages = messages.len(), "requesting chat completion");

    let url = format!("{}/chat/completions", settings.openai_base_url);
    let body = json!({ "model": model, "messages": messages, "temperature": TEMPERATURE });
    let completion: Value =
        http::send_json("chat completions", client.post(&url).bearer_auth(api_key).json(&body))
            .await?;
    let reply = completion_text(&completion)?;

    let history = updated_history(messages, &reply);
    let updated_history_json = serde_json::to_string(&history)
        .map_err(|e| AdapterError::malformed(format!("history encoding: {e}")))?;
    Ok(ChatResponse {
        assistant_message: reply,
        updated_history_json,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_or_non_array_history_is_empty() {
        assert!(parse_history(None).unwrap().is_empty());
        assert!(parse_history(Some("   ")).unwrap().is_empty());
        assert!(parse_history(Some(r#"{"role":"user"}"#)).unwrap().is_empty());
    }

    #[test]
    fn malformed_history_is_invalid_input() {
        let err = parse_history(Some("[{")).unwrap_err();
        assert!(matches!(err, AdapterError::InvalidInput(_)));
    }

    #[test]
    fn messages_wrap_history_with_system_and_user() {
        let history = parse_history(Some(
            r#"[{"role":"user","content":"oi"},{"role":"assistant","content":"olá"}]"#,
        ))
        .unwrap();
        let messages = build_messages("PROMPT", history, Some("  contexto extra "), "quero ajuda");
        let roles: Vec<&str> = messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user", "user"]);
        assert_eq!(messages[0].content, json!("PROMPT"));
        assert_eq!(messages[3].content, json!("contexto extra"));
        assert_eq!(messages[4].content, json!("quero ajuda"));
    }

    #[test]
    fn updated_history_blanks_system_prompt() {
        let messages = build_messages("very long prompt", Vec::new(), None, "hi");
        let history = updated_history(messages, "hello!");
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].content, json!(" "));
        assert_eq!(history[2], ChatMessage::new("assistant", "hello!"));
    }

    #[test]
    fn completion_without_content_is_malformed() {
        let err = completion_text(&json!({"choices": []})).unwrap_err();
        assert!(matches!(err, AdapterError::MalformedUpstreamResponse(_)));
        let ok = completion_text(&json!({"choices": [{"message": {"content": "yes"}}]})).unwrap();
        assert_eq!(ok, "yes");
    }

    #[test]
    fn missing_prompt_file_falls_back_to_blank() {
        assert_eq!(load_system_prompt("/definitely/not/here.txt"), " ");
    }
}

//! OpenAI Assistants thread functions: thread creation and the
//! submit → run → poll → extract orchestration.

mod client;
mod poll;
mod types;

pub use client::OpenAiAssistants;
pub use poll::{poll_run, PollPolicy};
pub use types::{MessageContent, MessageList, Role, Run, RunStatus, TextContent, ThreadMessage};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Settings;
use crate::error::{AdapterError, Result};

pub const NO_RESPONSE: &str = "No response";

/// Remote service that owns threads, their messages, and runs.
#[async_trait]
pub trait ConversationService: Send + Sync {
    async fn create_thread(&self) -> Result<String>;

    async fn add_message(&self, thread_id: &str, content: &str) -> Result<()>;

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run>;

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run>;

    /// Messages in the order the service returns them (newest first).
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>>;
}

/// First assistant-authored message as returned, or [`NO_RESPONSE`].
pub fn select_reply(messages: &[ThreadMessage]) -> String {
    messages
        .iter()
        .find(|m| m.role == Role::Assistant)
        .and_then(|m| m.first_text())
        .filter(|text| !text.is_empty())
        .unwrap_or(NO_RESPONSE)
        .to_string()
}

/// Appends the user message, runs the assistant, waits for the run and returns its reply.
pub async fn run_thread(
    service: &dyn ConversationService,
    thread_id: &str,
    assistant_id: &str,
    user_message: &str,
    policy: &PollPolicy,
) -> Result<String> {
    service.add_message(thread_id, user_message).await?;

    let run = service.create_run(thread_id, assistant_id).await?;
    info!(thread_id, run_id = %run.id, status = %run.status, "run started");

    let run = poll_run(service, thread_id, run, policy).await?;
    info!(thread_id, run_id = %run.id, "run completed");

    let messages = service.list_messages(thread_id).await?;
    Ok(select_reply(&messages))
}

fn required<'a>(name: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AdapterError::invalid_input(format!("'{name}' is required")));
    }
    Ok(value)
}

#[derive(Debug, Default, Deserialize)]
pub struct ThreadCreateRequest {
    #[serde(rename = "openAiApiKey", alias = "api_key", default)]
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct ThreadCreateResponse {
    pub thread_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ThreadRunRequest {
    #[serde(rename = "openAiApiKey", alias = "api_key", default)]
    pub api_key: String,
    #[serde(default)]
    pub thread_id: String,
    #[serde(default)]
    pub assistant_id: String,
    #[serde(default)]
    pub user_message: String,
}

#[derive(Debug, Serialize)]
pub struct ThreadRunResponse {
    pub reply: String,
}

pub async fn thread_create_handler(
    settings: &Settings,
    client: &Client,
    request: ThreadCreateRequest,
) -> Result<ThreadCreateResponse> {
    let api_key = required("openAiApiKey", &request.api_key)?;
    let service = OpenAiAssistants::new(client.clone(), &settings.openai_base_url, api_key);

    let thread_id = service.create_thread().await?;
    info!(thread_id = %thread_id, "thread created");
    Ok(ThreadCreateResponse { thread_id })
}

pub async fn thread_run_handler(
    settings: &Settings,
    client: &Client,
    request: ThreadRunRequest,
) -> Result<ThreadRunResponse> {
    let api_key = required("openAiApiKey", &request.api_key)?;
    let thread_id = required("thread_id", &request.thread_id)?;
    let assistant_id = required("assistant_id", &request.assistant_id)?;
    let user_message = required("user_message", &request.user_message)?;

    let service = OpenAiAssistants::new(client.clone(), &settings.openai_base_url, api_key);
    let reply = run_thread(
        &service,
        thread_id,
        assistant_id,
        user_message,
        &settings.poll_policy,
    )
    .await?;
    Ok(ThreadRunResponse { reply })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_reply_takes_first_assistant_message() {
        let messages = vec![
            ThreadMessage::text(Role::User, "ignored"),
            ThreadMessage::text(Role::Assistant, "newest"),
            ThreadMessage::text(Role::Assistant, "older"),
        ];
        assert_eq!(select_reply(&messages), "newest");
    }

    #[test]
    fn select_reply_without_assistant_is_sentinel() {
        let messages = vec![
            ThreadMessage::text(Role::User, "hi"),
            ThreadMessage::text(Role::System, "be nice"),
        ];
        assert_eq!(select_reply(&messages), NO_RESPONSE);
        assert_eq!(select_reply(&[]), NO_RESPONSE);
    }

    #[test]
    fn select_reply_non_text_assistant_message_is_sentinel() {
        let messages = vec![ThreadMessage {
            role: Role::Assistant,
            content: vec![MessageContent::Unsupported],
        }];
        assert_eq!(select_reply(&messages), NO_RESPONSE);
    }

    #[tokio::test]
    async fn thread_run_rejects_blank_fields_before_any_call() {
        let request = ThreadRunRequest {
            api_key: "sk-test".into(),
            thread_id: "thread_1".into(),
            assistant_id: "  ".into(),
            user_message: "hello".into(),
        };
        let err = thread_run_handler(&Settings::default(), &Client::new(), request)
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::InvalidInput(ref m) if m.contains("assistant_id")));
    }

    #[test]
    fn thread_run_request_accepts_api_key_alias() {
        let request: ThreadRunRequest = serde_json::from_value(serde_json::json!({
            "api_key": "sk-test",
            "thread_id": "t",
            "assistant_id": "a",
            "user_message": "m"
        }))
        .unwrap();
        assert_eq!(request.api_key, "sk-test");
    }
}

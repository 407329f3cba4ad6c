use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::json;

use super::types::{MessageList, Run, ThreadMessage};
use super::ConversationService;
use crate::error::Result;
use crate::http;

const ASSISTANTS_BETA: &str = "assistants=v2";

/// Threads API of the OpenAI Assistants service.
pub struct OpenAiAssistants {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct CreatedThread {
    id: String,
}

impl OpenAiAssistants {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        OpenAiAssistants {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", ASSISTANTS_BETA)
    }
}

#[async_trait]
impl ConversationService for OpenAiAssistants {
    async fn create_thread(&self) -> Result<String> {
        let url = format!("{}/threads", self.base_url);
        let request = self.authorized(self.client.post(&url)).json(&json!({}));
        let thread: CreatedThread = http::send_json("create thread", request).await?;
        Ok(thread.id)
    }

    async fn add_message(&self, thread_id: &str, content: &str) -> Result<()> {
        let url = format!("{}/threads/{}/messages", self.base_url, thread_id);
        let request = self
            .authorized(self.client.post(&url))
            .json(&json!({ "role": "user", "content": content }));
        http::send("add message", request).await?;
        Ok(())
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run> {
        let url = format!("{}/threads/{}/runs", self.base_url, thread_id);
        let request = self
            .authorized(self.client.post(&url))
            .json(&json!({ "assistant_id": assistant_id }));
        http::send_json("create run", request).await
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        let url = format!("{}/threads/{}/runs/{}", self.base_url, thread_id, run_id);
        http::send_json("get run", self.authorized(self.client.get(&url))).await
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>> {
        let url = format!("{}/threads/{}/messages", self.base_url, thread_id);
        let list: MessageList =
            http::send_json("list messages", self.authorized(self.client.get(&url))).await?;
        Ok(list.data)
    }
}

//! Agentless WhatsApp template messages.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::{fetch_access_token, Credentials};
use crate::config::Settings;
use crate::error::{AdapterError, Result};
use crate::http;

const ACTIVE_CONVERSATION: &str = "An active conversation is already in progress";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatsAppTemplateRequest {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub from_address: String,
    #[serde(default)]
    pub to_address: String,
    #[serde(default)]
    pub response_id: String,
    /// Anything other than an array is treated as no parameters.
    #[serde(default)]
    pub body_parameters: Value,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum WhatsAppTemplateResponse {
    Sent {
        success: bool,
        attempt: u8,
        response: Value,
    },
    Failed {
        success: bool,
        error: Value,
    },
}

pub fn build_payload(request: &WhatsAppTemplateRequest, use_existing_active_conversation: bool) -> Value {
    let parameters: Vec<Value> = request
        .body_parameters
        .as_array()
        .map(|values| {
            values
                .iter()
                .enumerate()
                .map(|(idx, value)| json!({ "id": (idx + 1).to_string(), "value": value }))
                .collect()
        })
        .unwrap_or_default();

    json!({
        "fromAddress": request.from_address,
        "toAddress": request.to_address,
        "toAddressMessengerType": "whatsapp",
        "useExistingActiveConversation": use_existing_active_conversation,
        "messagingTemplate": {
            "responseId": request.response_id,
            "bodyParameters": parameters,
        }
    })
}

fn is_active_conversation_conflict(err: &AdapterError) -> bool {
    let AdapterError::UpstreamRequestFailed { body, .. } = err else {
        return false;
    };
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .is_some_and(|message| message.contains(ACTIVE_CONVERSATION))
}

async fn send_template(
    settings: &Settings,
    client: &Client,
    request: &WhatsAppTemplateRequest,
) -> Result<(u8, Value)> {
    let region = &settings.genesys_region;
    let credentials = Credentials::new(&request.client_id, &request.client_secret);
    let token = fetch_access_token(client, &settings.genesys_login_url(region), &credentials).await?;

    let endpoint = format!(
        "{}/api/v2/conversations/messages/agentless",
        settings.genesys_api_url(region)
    );

    let first = build_payload(request, false);
    info!(to = %request.to_address, "sending template message");
    match http::send_json::<Value>("agentless message", client.post(&endpoint).bearer_auth(&token).json(&first)).await {
        Ok(response) => return Ok((1, response)),
        Err(e) if is_active_conversation_conflict(&e) => {
            warn!(error = %e, "conversation already active, retrying on it");
        }
        Err(e) => return Err(e),
    }

    let second = build_payload(request, true);
    let response = http::send_json::<Value>(
        "agentless message",
        client.post(&endpoint).bearer_auth(&token).json(&second),
    )
    .await?;
    Ok((2, response))
}

/// Sends the template, reusing an active conversation when the first attempt is refused
/// because one exists. Failures are reported in the response body.
pub async fn whatsapp_template_handler(
    settings: &Settings,
    client: &Client,
    request: WhatsAppTemplateRequest,
) -> WhatsAppTemplateResponse {
    match send_template(settings, client, &request).await {
        Ok((attempt, response)) => WhatsAppTemplateResponse::Sent {
            success: true,
            attempt,
            response,
        },
        Err(e) => {
            warn!(error = %e, "template message not sent");
            let error = match &e {
                AdapterError::UpstreamRequestFailed { body, .. } => {
                    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.clone()))
                }
                other => Value::String(other.to_string()),
            };
            WhatsAppTemplateResponse::Failed {
                success: false,
                error,
            }
        }
    }
}

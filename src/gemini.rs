//! Image analysis: downloads an image and asks Gemini about it with an inline base64 part.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::config::Settings;
use crate::error::{AdapterError, Result};
use crate::http;

#[derive(Debug, Default, Deserialize)]
pub struct ImageAnalysisRequest {
    #[serde(default)]
    pub image_uri: String,
    #[serde(rename = "GEMINI_API_KEY", default)]
    pub api_key: String,
    #[serde(default)]
    pub content_text: String,
    #[serde(default)]
    pub mime_type: String,
}

impl ImageAnalysisRequest {
    fn validate(&self) -> Result<()> {
        let fields = [
            ("image_uri", &self.image_uri),
            ("GEMINI_API_KEY", &self.api_key),
            ("content_text", &self.content_text),
            ("mime_type", &self.mime_type),
        ];
        match fields.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((name, _)) => Err(AdapterError::invalid_input(format!(
                "Parâmetro \"{name}\" é obrigatório."
            ))),
            None => Ok(()),
        }
    }
}

/// `generateContent` body with the prompt followed by the inline image.
pub fn build_request_body(content_text: &str, mime_type: &str, image: &[u8]) -> Value {
    json!({
        "contents": [{
            "parts": [
                { "text": content_text },
                { "inline_data": { "mime_type": mime_type, "data": STANDARD.encode(image) } }
            ]
        }]
    })
}

async fn download_image(client: &Client, uri: &str) -> Result<Vec<u8>> {
    let res = http::send("image download", client.get(uri)).await?;
    let bytes = res.bytes().await.map_err(|e| AdapterError::Transport {
        endpoint: "image download".to_string(),
        message: e.to_string(),
    })?;
    Ok(bytes.to_vec())
}

/// Returns Gemini's `generateContent` answer as received.
pub async fn image_analysis_handler(
    settings: &Settings,
    client: &Client,
    request: ImageAnalysisRequest,
) -> Result<Value> {
    request.validate()?;

    let image = download_image(client, request.image_uri.trim()).await?;
    info!(bytes = image.len(), mime_type = %request.mime_type, "image downloaded");

    let url = format!(
        "{}/v1beta/models/{}:generateContent",
        settings.gemini_base_url, settings.gemini_model
    );
    let body = build_request_body(&request.content_text, &request.mime_type, &image);
    let answer: Value = http::send_json(
        "gemini generateContent",
        client
            .post(&url)
            .query(&[("key", request.api_key.as_str())])
            .json(&body),
    )
    .await?;

    let candidates = answer
        .get("candidates")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    info!(candidates, "image analysed");
    Ok(answer)
}

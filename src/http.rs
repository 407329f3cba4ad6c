use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::error::{AdapterError, Result};

pub const USER_AGENT: &str = "genesys-lambda/1.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(25);

pub fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| AdapterError::Transport {
            endpoint: "client".to_string(),
            message: e.to_string(),
        })
}

/// Sends the request and rejects any non-2xx answer with its status and body.
pub async fn send(endpoint: &str, request: RequestBuilder) -> Result<Response> {
    let res = request.send().await.map_err(|e| AdapterError::Transport {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })?;
    if !res.status().is_success() {
        let status = res.status().as_u16();
        let body = res.text().await.unwrap_or_default();
        return Err(AdapterError::UpstreamRequestFailed {
            endpoint: endpoint.to_string(),
            status,
            body,
        });
    }
    Ok(res)
}

pub async fn send_json<T: DeserializeOwned>(endpoint: &str, request: RequestBuilder) -> Result<T> {
    let res = send(endpoint, request).await?;
    decode(endpoint, res).await
}

pub async fn decode<T: DeserializeOwned>(endpoint: &str, res: Response) -> Result<T> {
    let bytes = res.bytes().await.map_err(|e| AdapterError::Transport {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AdapterError::malformed(format!("{endpoint}: {e}")))
}

//! Genesys Cloud functions and the client-credentials token they share.

pub mod knowledge;
pub mod messaging;

use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::error::{AdapterError, Result};
use crate::http;

#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Credentials {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// Client-credentials grant against `{login_base_url}/oauth/token`.
pub async fn fetch_access_token(
    client: &Client,
    login_base_url: &str,
    credentials: &Credentials,
) -> Result<String> {
    if credentials.client_id.trim().is_empty() || credentials.client_secret.trim().is_empty() {
        return Err(AdapterError::invalid_input(
            "missing gcClientId or gcClientSecret for Genesys Cloud API call",
        ));
    }

    let url = format!("{login_base_url}/oauth/token");
    info!(url = %url, client_id = %credentials.client_id, "requesting Genesys Cloud token");
    let request = client
        .post(&url)
        .query(&[("grant_type", "client_credentials")])
        .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
        .header("Content-Type", "application/x-www-form-urlencoded");
    let token: TokenResponse = http::send_json("genesys oauth token", request).await?;

    token
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AdapterError::malformed("Genesys Cloud returned an empty access token"))
}

//! Municipality name search within a Brazilian state, backed by the IBGE locality API.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Settings;
use crate::error::{AdapterError, Result};
use crate::http;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MunicipalityRequest {
    #[serde(default)]
    pub estado: String,
    #[serde(default)]
    pub municipio_busca: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MunicipalityResponse {
    pub municipios_encontrados: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Municipality {
    pub nome: String,
}

/// Names containing `search`, case-insensitively, in upstream order.
pub fn matching_names(municipalities: &[Municipality], search: &str) -> Vec<String> {
    let needle = search.to_lowercase();
    municipalities
        .iter()
        .filter(|m| m.nome.to_lowercase().contains(&needle))
        .map(|m| m.nome.clone())
        .collect()
}

pub async fn municipalities_handler(
    settings: &Settings,
    client: &Client,
    request: MunicipalityRequest,
) -> Result<MunicipalityResponse> {
    let state = request.estado.trim();
    if state.is_empty() || request.municipio_busca.is_empty() {
        return Err(AdapterError::invalid_input(
            "'estado' and 'municipioBusca' are required",
        ));
    }

    let url = format!(
        "{}/api/v1/localidades/estados/{}/municipios",
        settings.ibge_base_url, state
    );
    let municipalities: Vec<Municipality> = http::send_json("ibge municipios", client.get(&url)).await?;

    let found = matching_names(&municipalities, &request.municipio_busca);
    info!(state, total = municipalities.len(), matched = found.len(), "municipalities filtered");
    Ok(MunicipalityResponse {
        municipios_encontrados: found,
    })
}

//! Current weather for a Brazilian postal code (CEP): ViaCEP address, Nominatim
//! coordinates, Open-Meteo forecast.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::config::Settings;
use crate::error::{AdapterError, Result};
use crate::http;

const TIMEZONE: &str = "America/Sao_Paulo";

#[derive(Debug, Default, Deserialize)]
pub struct WeatherRequest {
    #[serde(default)]
    pub cep: String,
}

#[derive(Debug, Serialize)]
pub struct WeatherResponse {
    pub endereco: String,
    pub previsao_tempo: Value,
}

#[derive(Debug, Default, Deserialize)]
pub struct ViaCepAddress {
    #[serde(default)]
    pub logradouro: String,
    #[serde(default)]
    pub bairro: String,
    #[serde(default)]
    pub localidade: String,
    #[serde(default)]
    pub uf: String,
    #[serde(default)]
    pub erro: Option<Value>,
}

impl ViaCepAddress {
    // ViaCEP flags unknown codes with `"erro": true` (or `"true"`)
    fn is_error(&self) -> bool {
        matches!(&self.erro, Some(Value::Bool(true))) || matches!(&self.erro, Some(Value::String(s)) if s == "true")
    }

    pub fn describe(&self) -> String {
        if self.logradouro.is_empty() {
            format!("{} - {}", self.localidade, self.uf)
        } else {
            format!(
                "{}, {}, {} - {}",
                self.logradouro, self.bairro, self.localidade, self.uf
            )
        }
    }
}

#[derive(Debug, Deserialize)]
struct Coordinates {
    lat: String,
    lon: String,
}

#[derive(Debug, Deserialize)]
struct Forecast {
    #[serde(default)]
    current_weather: Value,
}

pub async fn weather_handler(
    settings: &Settings,
    client: &Client,
    request: WeatherRequest,
) -> Result<WeatherResponse> {
    let cep = request.cep.trim();
    if cep.is_empty() {
        return Err(AdapterError::invalid_input("CEP é obrigatório"));
    }

    let via_cep_url = format!("{}/ws/{}/json/", settings.viacep_base_url, cep);
    let address: ViaCepAddress = http::send_json("viacep", client.get(&via_cep_url)).await?;
    if address.is_error() {
        return Err(AdapterError::invalid_input("CEP inválido"));
    }

    let geocode_url = format!("{}/search", settings.nominatim_base_url);
    let places: Vec<Coordinates> = http::send_json(
        "nominatim city search",
        client.get(&geocode_url).query(&[
            ("city", address.localidade.as_str()),
            ("state", address.uf.as_str()),
            ("country", "Brazil"),
            ("format", "json"),
            ("limit", "1"),
        ]),
    )
    .await?;
    let Some(place) = places.first() else {
        return Err(AdapterError::invalid_input(
            "Não foi possível obter coordenadas para esse CEP",
        ));
    };
    info!(cep, lat = %place.lat, lon = %place.lon, "CEP located");

    let forecast_url = format!("{}/v1/forecast", settings.open_meteo_base_url);
    let forecast: Forecast = http::send_json(
        "open-meteo forecast",
        client.get(&forecast_url).query(&[
            ("latitude", place.lat.as_str()),
            ("longitude", place.lon.as_str()),
            ("current_weather", "true"),
            ("timezone", TIMEZONE),
        ]),
    )
    .await?;

    Ok(WeatherResponse {
        endereco: address.describe(),
        previsao_tempo: forecast.current_weather,
    })
}

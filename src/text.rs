use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AdapterError, Result};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitiesRequest {
    #[serde(default)]
    pub input_cities_string: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct CitiesResponse {
    pub cities: Vec<Value>,
}

// Turns a JSON array carried as a string into a real collection
pub fn string_list_to_collection(request: CitiesRequest) -> Result<CitiesResponse> {
    let raw = match request.input_cities_string {
        Some(Value::String(s)) if !s.is_empty() => s,
        _ => {
            return Err(AdapterError::invalid_input(
                "inputCitiesString is required and must be a string.",
            ))
        }
    };
    let parsed: Value = serde_json::from_str(&raw).map_err(|_| {
        AdapterError::invalid_input(
            "Failed to parse inputCitiesString. It must be a valid JSON array string.",
        )
    })?;
    match parsed {
        Value::Array(cities) => Ok(CitiesResponse { cities }),
        _ => Err(AdapterError::invalid_input("Parsed value is not an array.")),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountRequest {
    #[serde(default)]
    pub input_string: Option<String>,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountResponse {
    pub character_count: usize,
}

/// Length in UTF-16 code units, as the calling platform measures strings.
pub fn character_count(request: CountRequest) -> CountResponse {
    let character_count = request
        .input_string
        .as_deref()
        .map_or(0, |s| s.encode_utf16().count());
    CountResponse { character_count }
}

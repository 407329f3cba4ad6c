//! Nearest-place lookup around a reference point, through Google Maps or OpenStreetMap.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::config::Settings;
use crate::error::{AdapterError, Result};
use crate::http;

const EARTH_RADIUS_M: f64 = 6_371_000.0;
const SEARCH_RADIUS_M: f64 = 3000.0;
const MAX_RESULTS: u32 = 10;
const PLACES_FIELD_MASK: &str = "places.formattedAddress,places.addressComponents,places.location";

/// Great-circle distance in metres between two WGS84 coordinates.
pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Index of the candidate closest to `(lat, lon)`; ties keep the earlier candidate.
pub fn nearest<T>(lat: f64, lon: f64, candidates: &[T], position: impl Fn(&T) -> (f64, f64)) -> Option<usize> {
    candidates
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let (clat, clon) = position(c);
            (i, haversine(lat, lon, clat, clon))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

pub fn compose_address(street: &str, number: &str) -> String {
    if number.is_empty() {
        street.to_string()
    } else {
        format!("{street}, {number}")
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FindPlaceRequest {
    #[serde(default)]
    pub reference: String,
    #[serde(rename = "placeName", default)]
    pub place_name: String,
    #[serde(rename = "GOOGLE_API_KEY", default)]
    pub google_api_key: String,
}

impl FindPlaceRequest {
    fn validate(&self) -> Result<()> {
        if self.reference.trim().is_empty() || self.place_name.trim().is_empty() {
            return Err(AdapterError::invalid_input(
                "'reference' and 'placeName' are required",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FindPlaceResponse {
    Found {
        address: String,
    },
    NotFound {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl FindPlaceResponse {
    fn not_found(message: impl Into<String>) -> Self {
        FindPlaceResponse::NotFound {
            message: message.into(),
            error: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Default, Deserialize)]
struct PlacesResponse {
    #[serde(default)]
    places: Vec<Place>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Place {
    #[serde(default)]
    formatted_address: String,
    #[serde(default)]
    address_components: Vec<AddressComponent>,
    location: PlaceLocation,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddressComponent {
    #[serde(default)]
    long_text: Option<String>,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceLocation {
    latitude: f64,
    longitude: f64,
}

fn component<'a>(components: &'a [AddressComponent], kind: &str) -> Option<&'a str> {
    components
        .iter()
        .find(|c| c.types.iter().any(|t| t == kind))
        .and_then(|c| c.long_text.as_deref())
        .filter(|s| !s.is_empty())
}

/// Google Geocoding for the reference, then Places text search biased around it.
pub async fn find_place_google(
    settings: &Settings,
    client: &Client,
    request: FindPlaceRequest,
) -> Result<FindPlaceResponse> {
    request.validate()?;

    let geocode_url = format!("{}/maps/api/geocode/json", settings.google_maps_base_url);
    let geocode: GeocodeResponse = http::send_json(
        "google geocode",
        client
            .get(&geocode_url)
            .query(&[("address", request.reference.as_str()), ("key", request.google_api_key.as_str())]),
    )
    .await?;
    let origin = match geocode.results.first() {
        Some(result) if geocode.status == "OK" => &result.geometry.location,
        _ => {
            return Ok(FindPlaceResponse::NotFound {
                message: format!("Geocoding failed: {}", geocode.status),
                error: geocode.error_message,
            })
        }
    };
    info!(lat = origin.lat, lon = origin.lng, "reference geocoded");

    let places_url = format!("{}/v1/places:searchText", settings.google_places_base_url);
    let body = json!({
        "textQuery": request.place_name,
        "maxResultCount": MAX_RESULTS,
        "locationBias": {
            "circle": {
                "center": { "latitude": origin.lat, "longitude": origin.lng },
                "radius": SEARCH_RADIUS_M,
            }
        }
    });
    let places: PlacesResponse = http::send_json(
        "google places search",
        client
            .post(&places_url)
            .header("X-Goog-Api-Key", &request.google_api_key)
            .header("X-Goog-FieldMask", PLACES_FIELD_MASK)
            .json(&body),
    )
    .await?;

    let Some(index) = nearest(origin.lat, origin.lng, &places.places, |p| {
        (p.location.latitude, p.location.longitude)
    }) else {
        return Ok(FindPlaceResponse::not_found("No nearby place found matching the name."));
    };
    let place = &places.places[index];

    let address = match component(&place.address_components, "route") {
        Some(street) => compose_address(
            street,
            component(&place.address_components, "street_number").unwrap_or_default(),
        ),
        None => place.formatted_address.clone(),
    };
    Ok(FindPlaceResponse::Found { address })
}

#[derive(Debug, Deserialize)]
struct OsmPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    address: Option<OsmAddress>,
}

#[derive(Debug, Default, Deserialize)]
struct OsmAddress {
    road: Option<String>,
    pedestrian: Option<String>,
    footway: Option<String>,
    house_number: Option<String>,
}

impl OsmAddress {
    /// First non-empty of road, pedestrian, footway.
    fn street(&self) -> Option<&str> {
        [&self.road, &self.pedestrian, &self.footway]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .find(|name| !name.is_empty())
    }
}

impl OsmPlace {
    fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.lat.parse().ok()?, self.lon.parse().ok()?))
    }
}

async fn nominatim_search(client: &Client, base_url: &str, query: &[(&str, String)]) -> Result<Vec<OsmPlace>> {
    let url = format!("{base_url}/search");
    let data: Value = http::send_json("nominatim search", client.get(&url).query(query)).await?;
    if !data.is_array() {
        return Ok(Vec::new());
    }
    serde_json::from_value(data).map_err(|e| AdapterError::malformed(format!("nominatim search: {e}")))
}

/// Nominatim search for the reference, then for the place name around it.
pub async fn find_place_osm(
    settings: &Settings,
    client: &Client,
    request: FindPlaceRequest,
) -> Result<FindPlaceResponse> {
    request.validate()?;

    let references = nominatim_search(
        client,
        &settings.nominatim_base_url,
        &[
            ("format", "json".to_string()),
            ("q", request.reference.clone()),
            ("limit", "1".to_string()),
        ],
    )
    .await?;
    let Some((lat, lon)) = references.first().and_then(OsmPlace::coordinates) else {
        return Ok(FindPlaceResponse::not_found("Reference point not found."));
    };
    info!(lat, lon, "reference located");

    let candidates: Vec<OsmPlace> = nominatim_search(
        client,
        &settings.nominatim_base_url,
        &[
            ("format", "json".to_string()),
            ("q", request.place_name.clone()),
            ("limit", MAX_RESULTS.to_string()),
            ("lat", lat.to_string()),
            ("lon", lon.to_string()),
            ("radius", SEARCH_RADIUS_M.to_string()),
            ("addressdetails", "1".to_string()),
        ],
    )
    .await?
    .into_iter()
    .filter(|p| p.coordinates().is_some())
    .collect();

    let Some(index) = nearest(lat, lon, &candidates, |p| p.coordinates().unwrap_or_default()) else {
        return Ok(FindPlaceResponse::not_found("No nearby place found matching the name."));
    };
    let address = candidates[index].address.as_ref();
    let Some(street) = address.and_then(OsmAddress::street) else {
        return Ok(FindPlaceResponse::not_found("Street name not available in address."));
    };
    let number = address
        .and_then(|a| a.house_number.as_deref())
        .unwrap_or_default();
    Ok(FindPlaceResponse::Found {
        address: compose_address(street, number),
    })
}

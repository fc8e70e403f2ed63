//! Google Geocoding API client (primary, keyed provider)

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use super::GeocodingProvider;
use crate::http::get_json;
use crate::models::ResolvedLocation;
use crate::{Result, WeatherHubError};

const PROVIDER: &str = "google";

/// Google Geocoding API client
pub struct GoogleGeocoder {
    client: Client,
    base_url: String,
    api_key: String,
}

/// Geocoding response envelope
#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted_address: String,
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

impl GeocodeResponse {
    /// First result, `None` for an empty answer, error for any failure status
    fn into_first(self) -> Result<Option<GeocodeResult>> {
        match self.status.as_str() {
            "OK" => Ok(self.results.into_iter().next()),
            "ZERO_RESULTS" => Ok(None),
            status => Err(WeatherHubError::api(format!(
                "Google geocoding returned {status}: {}",
                self.error_message.unwrap_or_default()
            ))),
        }
    }
}

impl GoogleGeocoder {
    #[must_use]
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl GeocodingProvider for GoogleGeocoder {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    #[instrument(skip(self))]
    async fn geocode(&self, query: &str) -> Result<Option<ResolvedLocation>> {
        let url = format!(
            "{}/json?address={}&key={}",
            self.base_url,
            urlencoding::encode(query),
            urlencoding::encode(&self.api_key)
        );

        let response: GeocodeResponse = get_json(&self.client, &url, PROVIDER).await?;
        let Some(result) = response.into_first()? else {
            return Ok(None);
        };

        let LatLng { lat, lng } = result.geometry.location;
        ResolvedLocation::new(lat, lng, result.formatted_address)
            .map(Some)
            .map_err(|e| WeatherHubError::api(format!("Google returned unusable coordinates: {e}")))
    }

    #[instrument(skip(self))]
    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<Option<String>> {
        let url = format!(
            "{}/json?latlng={},{}&key={}",
            self.base_url,
            latitude,
            longitude,
            urlencoding::encode(&self.api_key)
        );

        let response: GeocodeResponse = get_json(&self.client, &url, PROVIDER).await?;
        Ok(response.into_first()?.map(|result| result.formatted_address))
    }
}

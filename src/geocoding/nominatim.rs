//! Nominatim (OpenStreetMap) client: free, no API key required

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use super::GeocodingProvider;
use crate::http::get_json;
use crate::models::ResolvedLocation;
use crate::{Result, WeatherHubError};

const PROVIDER: &str = "nominatim";

/// Nominatim search and reverse client
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

/// Search hit; Nominatim encodes coordinates as strings
#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
    error: Option<String>,
}

impl SearchHit {
    fn into_location(self) -> Result<ResolvedLocation> {
        let parse = |value: &str, axis: &str| {
            value.trim().parse::<f64>().map_err(|e| {
                WeatherHubError::api(format!("Nominatim returned invalid {axis} '{value}': {e}"))
            })
        };
        let latitude = parse(&self.lat, "latitude")?;
        let longitude = parse(&self.lon, "longitude")?;

        ResolvedLocation::new(latitude, longitude, self.display_name).map_err(|e| {
            WeatherHubError::api(format!("Nominatim returned unusable coordinates: {e}"))
        })
    }
}

impl NominatimGeocoder {
    #[must_use]
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl GeocodingProvider for NominatimGeocoder {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    #[instrument(skip(self))]
    async fn geocode(&self, query: &str) -> Result<Option<ResolvedLocation>> {
        let url = format!(
            "{}/search?q={}&format=jsonv2&limit=1",
            self.base_url,
            urlencoding::encode(query)
        );

        let hits: Vec<SearchHit> = get_json(&self.client, &url, PROVIDER).await?;
        hits.into_iter()
            .next()
            .map(SearchHit::into_location)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<Option<String>> {
        let url = format!(
            "{}/reverse?lat={}&lon={}&format=jsonv2",
            self.base_url, latitude, longitude
        );

        let response: ReverseResponse = get_json(&self.client, &url, PROVIDER).await?;
        if let Some(error) = response.error {
            tracing::debug!("Nominatim could not name ({latitude}, {longitude}): {error}");
            return Ok(None);
        }
        Ok(response.display_name.filter(|name| !name.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn geocoder(server: &MockServer) -> NominatimGeocoder {
        let client = crate::http::build_client(Duration::from_secs(2), "weatherhub-test").unwrap();
        NominatimGeocoder::new(client, &server.uri())
    }

    #[tokio::test]
    async fn test_search_parses_string_coordinates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "Paris"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "lat": "48.8588897",
                "lon": "2.3200410",
                "display_name": "Paris, Île-de-France, France métropolitaine, France"
            }])))
            .mount(&server)
            .await;

        let location = geocoder(&server).geocode("Paris").await.unwrap().unwrap();
        assert!(location.display_name().contains("Paris"));
        assert_eq!(location.latitude(), 48.8588897);
        assert_eq!(location.longitude(), 2.320041);
    }

    #[tokio::test]
    async fn test_search_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        assert!(geocoder(&server).geocode("Atlantis").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_malformed_coordinates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "lat": "north", "lon": "2.3", "display_name": "Nowhere"
            }])))
            .mount(&server)
            .await;

        assert!(geocoder(&server).geocode("Nowhere").await.is_err());
    }

    #[tokio::test]
    async fn test_reverse_geocode() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .and(query_param("lat", "48.8566"))
            .and(query_param("lon", "2.3522"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "display_name": "Hôtel de Ville, Paris, France"
            })))
            .mount(&server)
            .await;

        let name = geocoder(&server).reverse_geocode(48.8566, 2.3522).await.unwrap();
        assert_eq!(name.as_deref(), Some("Hôtel de Ville, Paris, France"));
    }

    #[tokio::test]
    async fn test_reverse_geocode_ocean() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"error": "Unable to geocode"})),
            )
            .mount(&server)
            .await;

        assert!(geocoder(&server).reverse_geocode(0.0, -30.0).await.unwrap().is_none());
    }
}

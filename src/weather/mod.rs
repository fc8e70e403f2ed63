//! Weather retrieval with graceful degradation
//!
//! [`WeatherFetcher`] always produces a value. Without an API key it serves synthetic
//! data straight away; when the provider fails it logs the failure and serves
//! synthetic data for that call. Both cases are tagged [`DataSource::Synthetic`].

pub mod openweather;
pub mod synthetic;

use std::time::Duration;
use tracing::{info, warn};

use crate::cache::TtlCache;
use crate::config::WeatherConfig;
use crate::http::build_client;
use crate::models::{CurrentConditions, DataSource, ForecastSeries};
use crate::Result;

pub use openweather::OpenWeatherClient;

/// Current conditions and forecast lookups, memoized per rounded coordinate pair
pub struct WeatherFetcher {
    provider: Option<OpenWeatherClient>,
    current_cache: TtlCache<CurrentConditions>,
    forecast_cache: TtlCache<ForecastSeries>,
    ttl: Duration,
}

impl WeatherFetcher {
    #[must_use]
    pub fn new(provider: Option<OpenWeatherClient>, ttl: Duration) -> Self {
        if provider.is_none() {
            warn!("No weather API key configured, serving synthetic weather data");
        }

        Self {
            provider,
            current_cache: TtlCache::new("current_weather"),
            forecast_cache: TtlCache::new("forecast"),
            ttl,
        }
    }

    pub fn from_config(config: &WeatherConfig, ttl: Duration) -> Result<Self> {
        let provider = match &config.api_key {
            Some(api_key) => {
                let client = build_client(config.timeout(), &format!("weatherhub/{}", crate::VERSION))?;
                Some(OpenWeatherClient::new(client, &config.base_url, api_key))
            }
            None => None,
        };
        Ok(Self::new(provider, ttl))
    }

    /// Whether live data can be requested at all
    #[must_use]
    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    fn cache_key(kind: &str, lat: f64, lon: f64) -> String {
        format!("{kind}:{lat:.2}:{lon:.2}")
    }

    /// Current conditions; never fails
    pub async fn current(&self, lat: f64, lon: f64) -> CurrentConditions {
        let key = Self::cache_key("current", lat, lon);
        let fetched = self
            .current_cache
            .get_or_compute(&key, self.ttl, || async {
                let Some(provider) = &self.provider else {
                    return Some(synthetic::current(lat, lon));
                };
                match provider.current(lat, lon).await {
                    Ok(conditions) => Some(conditions),
                    Err(e) => {
                        warn!("Weather API error, serving synthetic conditions: {}", e);
                        None
                    }
                }
            })
            .await;

        fetched.unwrap_or_else(|| synthetic::current(lat, lon))
    }

    /// 5-day forecast in 3-hour steps; never fails
    pub async fn forecast(&self, lat: f64, lon: f64) -> ForecastSeries {
        let key = Self::cache_key("forecast", lat, lon);
        let fetched = self
            .forecast_cache
            .get_or_compute(&key, self.ttl, || async {
                let Some(provider) = &self.provider else {
                    return Some(synthetic::forecast(lat, lon));
                };
                match provider.forecast(lat, lon).await {
                    Ok(series) => Some(series),
                    Err(e) => {
                        warn!("Forecast API error, serving synthetic forecast: {}", e);
                        None
                    }
                }
            })
            .await;

        let series = fetched.unwrap_or_else(|| synthetic::forecast(lat, lon));
        if series.source == DataSource::Synthetic {
            info!("Forecast for {:.4}, {:.4} is synthetic", lat, lon);
        }
        series
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FORECAST_ENTRIES;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TTL: Duration = Duration::from_secs(1800);

    fn keyed(server: &MockServer) -> WeatherFetcher {
        let client = build_client(Duration::from_millis(300), "weatherhub-test").unwrap();
        WeatherFetcher::new(
            Some(OpenWeatherClient::new(client, &server.uri(), "weather_key_123")),
            TTL,
        )
    }

    fn current_body() -> serde_json::Value {
        serde_json::json!({
            "weather": [{"main": "Clear", "description": "clear sky"}],
            "main": {"temp": 18.0, "feels_like": 17.0, "temp_min": 16.0, "temp_max": 20.0,
                     "pressure": 1015, "humidity": 55},
            "wind": {"speed": 2.1},
            "visibility": 10000,
            "dt": 1_700_000_000
        })
    }

    #[tokio::test]
    async fn test_no_key_serves_synthetic_data() {
        let fetcher = WeatherFetcher::new(None, TTL);
        assert!(!fetcher.has_provider());

        let current = fetcher.current(48.8566, 2.3522).await;
        assert_eq!(current.source, DataSource::Synthetic);
        assert!(current.temperature_c.is_finite());

        let forecast = fetcher.forecast(48.8566, 2.3522).await;
        assert_eq!(forecast.len(), FORECAST_ENTRIES);
        assert_eq!(forecast.source, DataSource::Synthetic);
    }

    #[tokio::test]
    async fn test_no_key_synthetic_data_is_cached() {
        let fetcher = WeatherFetcher::new(None, TTL);
        let first = fetcher.current(10.0, 10.0).await;
        let second = fetcher.current(10.001, 10.001).await;
        assert_eq!(first.observed_at, second.observed_at);
        assert_eq!(first.temperature_c, second.temperature_c);
    }

    #[tokio::test]
    async fn test_live_data_is_cached_per_rounded_pair() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = keyed(&server);
        let first = fetcher.current(48.8566, 2.3522).await;
        let second = fetcher.current(48.8601, 2.3549).await;
        assert_eq!(first.source, DataSource::Live);
        assert_eq!(second.source, DataSource::Live);
        assert_eq!(second.temperature_c, 18.0);
    }

    #[tokio::test]
    async fn test_provider_failure_degrades_and_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let fetcher = keyed(&server);
        let current = fetcher.current(48.8566, 2.3522).await;
        assert!(current.is_synthetic());

        let forecast = fetcher.forecast(48.8566, 2.3522).await;
        assert_eq!(forecast.source, DataSource::Synthetic);
        assert_eq!(forecast.len(), FORECAST_ENTRIES);
    }

    #[tokio::test]
    async fn test_provider_timeout_degrades() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(current_body())
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let current = keyed(&server).current(1.0, 1.0).await;
        assert!(current.is_synthetic());
    }

    #[tokio::test]
    async fn test_partial_forecast_degrades_to_full_synthetic_series() {
        let server = MockServer::start().await;
        let list: Vec<serde_json::Value> = (0..5)
            .map(|i| serde_json::json!({"dt": 1_700_000_000 + i * 10_800, "main": {"temp": 9.0}}))
            .collect();
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"list": list})))
            .mount(&server)
            .await;

        let forecast = keyed(&server).forecast(1.0, 1.0).await;
        assert_eq!(forecast.len(), FORECAST_ENTRIES);
        assert_eq!(forecast.source, DataSource::Synthetic);
    }

    #[test]
    fn test_cache_key_rounds_coordinates() {
        assert_eq!(WeatherFetcher::cache_key("current", 48.8566, 2.3522), "current:48.86:2.35");
        assert_eq!(WeatherFetcher::cache_key("forecast", -33.8688, 151.2093), "forecast:-33.87:151.21");
    }
}

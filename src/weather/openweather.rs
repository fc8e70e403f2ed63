//! OpenWeatherMap client and response conversion
//!
//! Requests are made in metric units, so temperatures arrive in Celsius and wind
//! speeds in m/s.

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::http::get_json;
use crate::models::{
    ConditionKind, CurrentConditions, DataSource, FORECAST_ENTRIES, FORECAST_STEP_HOURS, ForecastEntry,
    ForecastSeries,
};
use crate::{Result, WeatherHubError};

const PROVIDER: &str = "openweathermap";

/// OpenWeatherMap current-weather and 5-day forecast client
pub struct OpenWeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
}

/// `/weather` response
#[derive(Debug, Deserialize)]
struct CurrentResponse {
    main: MainBlock,
    #[serde(default)]
    weather: Vec<ConditionBlock>,
    #[serde(default)]
    wind: WindBlock,
    visibility: Option<f64>,
    dt: i64,
}

/// `/forecast` response
#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    list: Vec<ForecastItem>,
}

#[derive(Debug, Deserialize)]
struct ForecastItem {
    dt: i64,
    main: MainBlock,
    #[serde(default)]
    weather: Vec<ConditionBlock>,
    #[serde(default)]
    wind: WindBlock,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: f64,
    feels_like: Option<f64>,
    temp_min: Option<f64>,
    temp_max: Option<f64>,
    pressure: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ConditionBlock {
    main: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Default, Deserialize)]
struct WindBlock {
    #[serde(default)]
    speed: f64,
}

fn timestamp(dt: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(dt, 0)
        .ok_or_else(|| WeatherHubError::api(format!("Invalid timestamp from {PROVIDER}: {dt}")))
}

fn humidity_pct(humidity: Option<f64>) -> u8 {
    humidity.unwrap_or(0.0).round().clamp(0.0, 100.0) as u8
}

fn condition(weather: &[ConditionBlock]) -> (ConditionKind, String) {
    weather.first().map_or((ConditionKind::Unknown, String::new()), |block| {
        (ConditionKind::from_provider(&block.main), block.description.clone())
    })
}

impl CurrentResponse {
    fn into_conditions(self) -> Result<CurrentConditions> {
        let (condition, description) = condition(&self.weather);
        let main = self.main;

        Ok(CurrentConditions {
            temperature_c: main.temp,
            feels_like_c: main.feels_like.unwrap_or(main.temp),
            temp_min_c: main.temp_min.unwrap_or(main.temp),
            temp_max_c: main.temp_max.unwrap_or(main.temp),
            condition,
            description,
            humidity_pct: humidity_pct(main.humidity),
            wind_speed_ms: self.wind.speed.max(0.0),
            pressure_hpa: main.pressure.unwrap_or(0.0).round().max(0.0) as u32,
            visibility_m: self.visibility.map(|v| v.round().max(0.0) as u32),
            observed_at: timestamp(self.dt)?,
            source: DataSource::Live,
        })
    }
}

impl ForecastItem {
    fn into_entry(self) -> Result<ForecastEntry> {
        let (condition, _) = condition(&self.weather);
        Ok(ForecastEntry {
            time: timestamp(self.dt)?,
            temperature_c: self.main.temp,
            condition,
            humidity_pct: humidity_pct(self.main.humidity),
            wind_speed_ms: self.wind.speed.max(0.0),
        })
    }
}

impl OpenWeatherClient {
    #[must_use]
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn url(&self, endpoint: &str, lat: f64, lon: f64) -> String {
        format!(
            "{}/{}?lat={}&lon={}&appid={}&units=metric",
            self.base_url,
            endpoint,
            lat,
            lon,
            urlencoding::encode(&self.api_key)
        )
    }

    /// Get current weather for a location
    #[instrument(skip(self))]
    pub async fn current(&self, lat: f64, lon: f64) -> Result<CurrentConditions> {
        let response: CurrentResponse =
            get_json(&self.client, &self.url("weather", lat, lon), PROVIDER).await?;
        let conditions = response.into_conditions()?;

        info!(
            "Current weather at {:.4}, {:.4}: {} {}",
            lat,
            lon,
            conditions.format_temperature(),
            conditions.condition
        );
        Ok(conditions)
    }

    /// Get the 5-day / 3-hour forecast for a location
    #[instrument(skip(self))]
    pub async fn forecast(&self, lat: f64, lon: f64) -> Result<ForecastSeries> {
        let response: ForecastResponse =
            get_json(&self.client, &self.url("forecast", lat, lon), PROVIDER).await?;

        if response.list.len() < FORECAST_ENTRIES {
            return Err(WeatherHubError::api(format!(
                "Forecast response contained {} entries, expected {FORECAST_ENTRIES}",
                response.list.len()
            )));
        }

        let mut entries = response
            .list
            .into_iter()
            .map(ForecastItem::into_entry)
            .collect::<Result<Vec<_>>>()?;
        entries.sort_by_key(|entry| entry.time);
        entries.truncate(FORECAST_ENTRIES);

        let step = Duration::hours(FORECAST_STEP_HOURS);
        if entries.windows(2).any(|pair| pair[1].time - pair[0].time != step) {
            return Err(WeatherHubError::api(format!(
                "Forecast entries are not spaced {FORECAST_STEP_HOURS} hours apart"
            )));
        }

        info!("Retrieved forecast with {} data points", entries.len());
        Ok(ForecastSeries::new(entries, DataSource::Live))
    }
}

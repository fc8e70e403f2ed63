//! Placeholder weather used when the provider is unavailable
//!
//! Values are random but bounded; the shape matches live data exactly: same fields,
//! 40 forecast entries, three hours apart, starting now.

use chrono::{Duration, Utc};
use rand::RngExt;

use crate::models::{
    ConditionKind, CurrentConditions, DataSource, FORECAST_ENTRIES, FORECAST_STEP_HOURS,
    ForecastEntry, ForecastSeries,
};

/// Maximum deviation from the latitude-based base temperature
const TEMPERATURE_JITTER: f64 = 10.0;

/// Base temperature for a latitude: warm at the equator, cold at the poles
#[must_use]
pub fn base_temperature(lat: f64) -> f64 {
    20.0 - 0.5 * lat.abs()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn description(condition: ConditionKind) -> &'static str {
    match condition {
        ConditionKind::Clear => "clear sky",
        ConditionKind::Clouds => "scattered clouds",
        ConditionKind::Rain => "light rain",
        ConditionKind::Snow => "light snow",
        _ => "unknown",
    }
}

fn random_condition(rng: &mut impl RngExt) -> ConditionKind {
    ConditionKind::SYNTHETIC[rng.random_range(0..ConditionKind::SYNTHETIC.len())]
}

/// Synthetic current conditions for a coordinate pair
#[must_use]
pub fn current(lat: f64, _lon: f64) -> CurrentConditions {
    let mut rng = rand::rng();
    let temperature = base_temperature(lat) + rng.random_range(-TEMPERATURE_JITTER..=TEMPERATURE_JITTER);
    let condition = random_condition(&mut rng);

    CurrentConditions {
        temperature_c: round1(temperature),
        feels_like_c: round1(temperature + rng.random_range(-3.0..=3.0)),
        temp_min_c: round1(temperature - rng.random_range(2.0..=5.0)),
        temp_max_c: round1(temperature + rng.random_range(2.0..=5.0)),
        condition,
        description: description(condition).to_string(),
        humidity_pct: rng.random_range(30..=90),
        wind_speed_ms: round1(rng.random_range(0.0..=15.0)),
        pressure_hpa: rng.random_range(1000..=1030),
        visibility_m: Some(rng.random_range(5000..=10_000)),
        observed_at: Utc::now(),
        source: DataSource::Synthetic,
    }
}

/// Synthetic 5-day forecast in 3-hour steps, starting now
#[must_use]
pub fn forecast(lat: f64, _lon: f64) -> ForecastSeries {
    let mut rng = rand::rng();
    let base = base_temperature(lat);
    let start = Utc::now();

    let entries = (0..FORECAST_ENTRIES)
        .map(|step| {
            let offset = Duration::hours(FORECAST_STEP_HOURS * step as i64);
            ForecastEntry {
                time: start + offset,
                temperature_c: round1(base + rng.random_range(-8.0..=8.0)),
                condition: random_condition(&mut rng),
                humidity_pct: rng.random_range(30..=90),
                wind_speed_ms: round1(rng.random_range(0.0..=10.0)),
            }
        })
        .collect();

    ForecastSeries::new(entries, DataSource::Synthetic)
}

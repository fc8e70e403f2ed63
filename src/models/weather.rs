//! Current weather model and display methods

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a weather value came from
///
/// Purely informational: live and synthetic values have the same shape, so
/// consumers that only read the measurements need no branching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Reading returned by the weather provider
    Live,
    /// Placeholder generated because the provider was unavailable
    Synthetic,
}

/// Coarse weather condition, following the provider's condition groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionKind {
    Clear,
    Clouds,
    Rain,
    Drizzle,
    Thunderstorm,
    Snow,
    /// Mist, fog, haze, smoke, dust and other visibility groups
    Atmosphere,
    Unknown,
}

impl ConditionKind {
    /// Kinds the synthetic generator draws from
    pub const SYNTHETIC: [ConditionKind; 4] = [Self::Clear, Self::Clouds, Self::Rain, Self::Snow];

    /// Map a provider condition group (`weather[0].main`) to a kind
    #[must_use]
    pub fn from_provider(main: &str) -> Self {
        match main.trim().to_ascii_lowercase().as_str() {
            "clear" => Self::Clear,
            "clouds" => Self::Clouds,
            "rain" => Self::Rain,
            "drizzle" => Self::Drizzle,
            "thunderstorm" => Self::Thunderstorm,
            "snow" => Self::Snow,
            "mist" | "smoke" | "haze" | "dust" | "fog" | "sand" | "ash" | "squall" | "tornado" => {
                Self::Atmosphere
            }
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::Clouds => "Clouds",
            Self::Rain => "Rain",
            Self::Drizzle => "Drizzle",
            Self::Thunderstorm => "Thunderstorm",
            Self::Snow => "Snow",
            Self::Atmosphere => "Atmosphere",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current conditions at a location, in metric units
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CurrentConditions {
    /// Temperature in Celsius
    pub temperature_c: f64,
    /// Apparent temperature in Celsius
    pub feels_like_c: f64,
    /// Minimum temperature currently observed in the area
    pub temp_min_c: f64,
    /// Maximum temperature currently observed in the area
    pub temp_max_c: f64,
    pub condition: ConditionKind,
    /// Provider's free-text description, e.g. "light rain"
    pub description: String,
    /// Relative humidity percentage (0-100)
    pub humidity_pct: u8,
    /// Wind speed in m/s
    pub wind_speed_ms: f64,
    /// Sea-level pressure in hPa
    pub pressure_hpa: u32,
    /// Visibility in meters, when reported
    pub visibility_m: Option<u32>,
    pub observed_at: DateTime<Utc>,
    pub source: DataSource,
}

impl CurrentConditions {
    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        self.source == DataSource::Synthetic
    }

    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.1}°C", self.temperature_c)
    }

    /// Format wind information
    #[must_use]
    pub fn format_wind(&self) -> String {
        format!("{:.1} m/s", self.wind_speed_ms)
    }

    /// Format atmospheric pressure with unit
    #[must_use]
    pub fn format_pressure(&self) -> String {
        format!("{} hPa", self.pressure_hpa)
    }
}

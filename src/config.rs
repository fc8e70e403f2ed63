//! Configuration management for `WeatherHub`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::WeatherHubError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for `WeatherHub`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Geocoding provider configuration
    pub geocoding: GeocodingConfig,
    /// Weather provider configuration
    pub weather: WeatherConfig,
    /// Result cache configuration
    pub cache: CacheConfig,
    /// Record storage configuration
    pub storage: StorageConfig,
    /// Conversational assistant configuration
    pub assistant: AssistantConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// HTTP server configuration
    pub server: ServerConfig,
}

/// Geocoding provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    /// Google Geocoding API key; the primary provider is skipped without it
    pub google_api_key: Option<String>,
    /// Base URL of the Google Geocoding API
    pub google_base_url: String,
    /// Base URL of the Nominatim (OpenStreetMap) API
    pub nominatim_base_url: String,
    /// User agent sent to Nominatim, which rejects anonymous clients
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
}

/// Weather provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key; synthetic data is served without it
    pub api_key: Option<String>,
    /// Base URL for the weather API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
}

/// Result cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Lifetime of geocoding results in minutes
    pub geocode_ttl_minutes: u32,
    /// Lifetime of weather results in minutes
    pub weather_ttl_minutes: u32,
}

/// Record storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory of the record database
    pub path: String,
}

/// Conversational assistant settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Chat-completions API key; simple mode is used without it
    pub api_key: Option<String>,
    /// Base URL of the chat-completions API
    pub base_url: String,
    /// Model name
    pub model: String,
    /// Maximum tokens in an answer
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listening port
    pub port: u16,
}

// Default value functions
fn default_timeout() -> u32 {
    10
}

fn default_storage_path() -> String {
    dirs::data_dir()
        .map(|dir| dir.join("weatherhub").join("records"))
        .unwrap_or_else(|| PathBuf::from("weatherhub-records"))
        .to_string_lossy()
        .into_owned()
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            google_api_key: None,
            google_base_url: "https://maps.googleapis.com/maps/api/geocode".to_string(),
            nominatim_base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: format!("weatherhub/{}", crate::VERSION),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openweathermap.org/data/2.5".to_string(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            geocode_ttl_minutes: 60,
            weather_ttl_minutes: 30,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 400,
            temperature: 0.7,
            timeout_seconds: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

impl GeocodingConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl WeatherConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl AssistantConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl CacheConfig {
    #[must_use]
    pub fn geocode_ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.geocode_ttl_minutes) * 60)
    }

    #[must_use]
    pub fn weather_ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.weather_ttl_minutes) * 60)
    }
}

impl HubConfig {
    /// Load configuration from a file (or the default location) and environment variables
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // WEATHERHUB_WEATHER__API_KEY -> weather.api_key
        builder = builder.add_source(
            Environment::with_prefix("WEATHERHUB")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: HubConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_conventional_keys(|name| std::env::var(name).ok());
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("weatherhub").join("config.toml"))
    }

    /// Fill unset provider keys from their conventional environment variable names
    pub fn apply_conventional_keys<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let fill = |slot: &mut Option<String>, name: &str| {
            if slot.is_none() {
                *slot = lookup(name).filter(|value| !value.trim().is_empty());
            }
        };
        fill(&mut self.geocoding.google_api_key, "GOOGLE_GEOCODING_API_KEY");
        fill(&mut self.weather.api_key, "OPENWEATHER_API_KEY");
        fill(&mut self.assistant.api_key, "OPENAI_API_KEY");
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        let keys = [
            ("Google geocoding", &self.geocoding.google_api_key),
            ("Weather", &self.weather.api_key),
            ("Assistant", &self.assistant.api_key),
        ];

        for (service, key) in keys {
            let Some(key) = key else { continue };
            if key.is_empty() {
                return Err(WeatherHubError::config(format!(
                    "{service} API key cannot be empty if provided. Either remove it or provide a valid key."
                ))
                .into());
            }
            if key.len() < 8 {
                return Err(WeatherHubError::config(format!(
                    "{service} API key appears to be invalid (too short). Please check your API key."
                ))
                .into());
            }
            if key.len() > 200 {
                return Err(WeatherHubError::config(format!(
                    "{service} API key appears to be invalid (too long). Please check your API key."
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        let timeouts = [
            ("Geocoding", self.geocoding.timeout_seconds),
            ("Weather", self.weather.timeout_seconds),
            ("Assistant", self.assistant.timeout_seconds),
        ];
        for (service, timeout) in timeouts {
            if timeout == 0 || timeout > 300 {
                return Err(WeatherHubError::config(format!(
                    "{service} API timeout must be between 1 and 300 seconds"
                ))
                .into());
            }
        }

        for (name, minutes) in [
            ("Geocoding", self.cache.geocode_ttl_minutes),
            ("Weather", self.cache.weather_ttl_minutes),
        ] {
            if minutes == 0 || minutes > 7 * 24 * 60 {
                return Err(WeatherHubError::config(format!(
                    "{name} cache TTL must be between 1 minute and 1 week"
                ))
                .into());
            }
        }

        if !(0.0..=2.0).contains(&self.assistant.temperature) {
            return Err(
                WeatherHubError::config("Assistant temperature must be between 0 and 2").into(),
            );
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(WeatherHubError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(WeatherHubError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let urls = [
            ("Google geocoding", &self.geocoding.google_base_url),
            ("Nominatim", &self.geocoding.nominatim_base_url),
            ("Weather", &self.weather.base_url),
            ("Assistant", &self.assistant.base_url),
        ];
        for (service, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(WeatherHubError::config(format!(
                    "{service} API base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        if self.storage.path.trim().is_empty() {
            return Err(WeatherHubError::config("Storage path cannot be empty").into());
        }

        Ok(())
    }
}

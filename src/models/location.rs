//! Location model for resolved coordinates and display names

use crate::{Result, WeatherHubError};
use serde::Serialize;

/// A location with validated coordinates and a human-readable name
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ResolvedLocation {
    /// Latitude in decimal degrees, within [-90, 90]
    latitude: f64,
    /// Longitude in decimal degrees, within [-180, 180]
    longitude: f64,
    /// Canonical display name
    display_name: String,
}

/// Check that a coordinate pair lies within the valid ranges
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(WeatherHubError::validation(format!(
            "Latitude must be between -90 and 90, got {latitude}"
        )));
    }

    if !(-180.0..=180.0).contains(&longitude) {
        return Err(WeatherHubError::validation(format!(
            "Longitude must be between -180 and 180, got {longitude}"
        )));
    }

    Ok(())
}

impl ResolvedLocation {
    /// Create a location, rejecting out-of-range coordinates
    pub fn new(latitude: f64, longitude: f64, display_name: impl Into<String>) -> Result<Self> {
        validate_coordinates(latitude, longitude)?;
        Ok(Self {
            latitude,
            longitude,
            display_name: display_name.into(),
        })
    }

    /// Create a location named after its own coordinates
    pub fn unnamed(latitude: f64, longitude: f64) -> Result<Self> {
        Self::new(latitude, longitude, Self::fallback_name(latitude, longitude))
    }

    /// Display name used when no provider can name a coordinate pair
    #[must_use]
    pub fn fallback_name(latitude: f64, longitude: f64) -> String {
        format!("Location ({latitude:.4}, {longitude:.4})")
    }

    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

//! Location input classification
//!
//! Decides whether raw user input is a coordinate pair or a place name before
//! anything touches the network.

use crate::models::validate_coordinates;
use crate::{Result, WeatherHubError};

/// Maximum length of any location query, in characters
const MAX_INPUT_CHARS: usize = 200;

/// Minimum length of any location query, in characters
const MIN_INPUT_CHARS: usize = 2;

/// Maximum number of commas in a location query
const MAX_COMMAS: usize = 3;

/// Types of location input
#[derive(Debug, Clone, PartialEq)]
pub enum LocationInput {
    /// Coordinates (latitude, longitude), already range-checked
    Coordinates(f64, f64),
    /// Place name or address, trimmed
    PlaceName(String),
}

/// Location parsing utilities
pub struct LocationParser;

impl LocationParser {
    /// Classify location input
    ///
    /// Input of the form `lat,lng` (optionally with whitespace after the comma) is a
    /// coordinate pair and must be in range; anything else is a place name.
    pub fn parse(input: &str) -> Result<LocationInput> {
        let input = input.trim();
        if input.is_empty() {
            return Err(WeatherHubError::EmptyInput);
        }
        Self::validate_shape(input)?;

        if let Some((lat, lon)) = Self::split_coordinates(input) {
            // Halves matched the decimal shape, so a parse failure can only be
            // pathological input; it is then treated as a name.
            if let (Ok(lat), Ok(lon)) = (lat.parse::<f64>(), lon.parse::<f64>()) {
                validate_coordinates(lat, lon)?;
                return Ok(LocationInput::Coordinates(lat, lon));
            }
        }

        Ok(LocationInput::PlaceName(input.to_string()))
    }

    /// Split `lat,lng` into its halves when both look like decimal numbers
    fn split_coordinates(input: &str) -> Option<(&str, &str)> {
        let (lat, lon) = input.split_once(',')?;
        let lon = lon.trim_start();
        (Self::is_decimal(lat) && Self::is_decimal(lon)).then_some((lat, lon))
    }

    /// Matches `-?\d+\.?\d*`
    fn is_decimal(value: &str) -> bool {
        let unsigned = value.strip_prefix('-').unwrap_or(value);
        let (whole, fraction) = match unsigned.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (unsigned, ""),
        };

        !whole.is_empty()
            && whole.chars().all(|c| c.is_ascii_digit())
            && fraction.chars().all(|c| c.is_ascii_digit())
    }

    fn validate_shape(input: &str) -> Result<()> {
        let chars = input.chars().count();
        if chars > MAX_INPUT_CHARS {
            return Err(WeatherHubError::validation(format!(
                "Location input too long (max {MAX_INPUT_CHARS} characters)"
            )));
        }

        if chars < MIN_INPUT_CHARS {
            return Err(WeatherHubError::validation(format!(
                "Location input too short (min {MIN_INPUT_CHARS} characters)"
            )));
        }

        if input.matches(',').count() > MAX_COMMAS {
            return Err(WeatherHubError::validation("Too many commas in location"));
        }

        Ok(())
    }
}

//! Location Resolution Module
//!
//! This module turns raw location input (coordinates, place names, addresses)
//! into a [`ResolvedLocation`].

use crate::geocoding::GeocodingResolver;
use crate::location_parser::{LocationInput, LocationParser};
use crate::models::{ResolvedLocation, validate_coordinates};
use crate::Result;
use tracing::debug;

/// Service for resolving location inputs
pub struct LocationResolver {
    geocoder: GeocodingResolver,
}

impl LocationResolver {
    #[must_use]
    pub fn new(geocoder: GeocodingResolver) -> Self {
        Self { geocoder }
    }

    /// Resolve raw input into a location
    ///
    /// Blank input and out-of-range coordinates are errors. `Ok(None)` means no
    /// provider could find the place.
    pub async fn resolve(&self, input: &str) -> Result<Option<ResolvedLocation>> {
        let location = match LocationParser::parse(input)? {
            LocationInput::Coordinates(lat, lon) => Some(self.name_coordinates(lat, lon).await?),
            LocationInput::PlaceName(name) => {
                debug!("Geocoding location name: {}", name);
                self.geocoder.resolve(&name).await
            }
        };

        if let Some(location) = &location {
            debug!(
                "Resolved location: {} at ({})",
                location.display_name(),
                location.format_coordinates()
            );
        }

        Ok(location)
    }

    /// Resolve coordinates to a location with a proper name via reverse geocoding
    ///
    /// Used directly for map clicks. The name falls back to the coordinates
    /// themselves, so this never comes back empty for valid input.
    pub async fn name_coordinates(&self, lat: f64, lon: f64) -> Result<ResolvedLocation> {
        validate_coordinates(lat, lon)?;
        let name = self.geocoder.display_name(lat, lon).await;
        ResolvedLocation::new(lat, lon, name)
    }

    #[must_use]
    pub fn geocoder(&self) -> &GeocodingResolver {
        &self.geocoder
    }
}

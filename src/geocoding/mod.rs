//! Geocoding and reverse geocoding
//!
//! Providers are tried in order and the first one that answers wins:
//! - Google Geocoding (primary, only when an API key is configured)
//! - Nominatim / OpenStreetMap (secondary, keyless)
//!
//! A provider that fails or finds nothing hands over to the next one. When every
//! provider comes up empty the location is simply not found.

pub mod google;
pub mod nominatim;

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cache::TtlCache;
use crate::config::GeocodingConfig;
use crate::http::build_client;
use crate::models::ResolvedLocation;
use crate::Result;

pub use google::GoogleGeocoder;
pub use nominatim::NominatimGeocoder;

/// A geocoding provider that can resolve place names to coordinates and vice versa
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// Short provider name for logs
    fn name(&self) -> &'static str;

    /// Forward geocode: the best match for a place name, if any
    async fn geocode(&self, query: &str) -> Result<Option<ResolvedLocation>>;

    /// Reverse geocode: a display name for a coordinate pair, if any
    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<Option<String>>;
}

/// Ordered provider chain with memoized results
pub struct GeocodingResolver {
    providers: Vec<Box<dyn GeocodingProvider>>,
    forward_cache: TtlCache<ResolvedLocation>,
    reverse_cache: TtlCache<String>,
    ttl: Duration,
}

impl GeocodingResolver {
    /// Create a resolver over an explicit provider chain
    #[must_use]
    pub fn new(providers: Vec<Box<dyn GeocodingProvider>>, ttl: Duration) -> Self {
        Self {
            providers,
            forward_cache: TtlCache::new("geocode"),
            reverse_cache: TtlCache::new("reverse_geocode"),
            ttl,
        }
    }

    /// Build the standard chain: Google when keyed, then Nominatim
    pub fn from_config(config: &GeocodingConfig, ttl: Duration) -> Result<Self> {
        let client = build_client(config.timeout(), &config.user_agent)?;
        let mut providers: Vec<Box<dyn GeocodingProvider>> = Vec::with_capacity(2);

        if let Some(api_key) = &config.google_api_key {
            providers.push(Box::new(GoogleGeocoder::new(
                client.clone(),
                &config.google_base_url,
                api_key,
            )));
        } else {
            info!("No Google geocoding key configured, using Nominatim only");
        }
        providers.push(Box::new(NominatimGeocoder::new(
            client,
            &config.nominatim_base_url,
        )));

        Ok(Self::new(providers, ttl))
    }

    /// Names of the providers in the order they are consulted
    #[must_use]
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Resolve a place name to a location, or `None` when no provider knows it
    pub async fn resolve(&self, place_name: &str) -> Option<ResolvedLocation> {
        let query = place_name.trim();
        self.forward_cache
            .get_or_compute(query, self.ttl, || self.geocode_uncached(query))
            .await
    }

    /// Resolve coordinates to a display name, or `None` when no provider can name them
    pub async fn reverse(&self, latitude: f64, longitude: f64) -> Option<String> {
        let key = format!("{latitude},{longitude}");
        self.reverse_cache
            .get_or_compute(&key, self.ttl, || self.reverse_uncached(latitude, longitude))
            .await
    }

    /// Display name for coordinates, falling back to `Location (<lat>, <lng>)`
    pub async fn display_name(&self, latitude: f64, longitude: f64) -> String {
        match self.reverse(latitude, longitude).await {
            Some(name) => name,
            None => {
                debug!("No provider could name ({latitude}, {longitude}), using coordinates");
                ResolvedLocation::fallback_name(latitude, longitude)
            }
        }
    }

    async fn geocode_uncached(&self, query: &str) -> Option<ResolvedLocation> {
        for provider in &self.providers {
            match provider.geocode(query).await {
                Ok(Some(location)) => {
                    info!(
                        provider = provider.name(),
                        "Resolved '{}' to {} ({})",
                        query,
                        location.display_name(),
                        location.format_coordinates()
                    );
                    return Some(location);
                }
                Ok(None) => debug!(provider = provider.name(), "No results for '{}'", query),
                Err(e) => warn!(provider = provider.name(), "Geocoding '{}' failed: {}", query, e),
            }
        }

        warn!("Location '{}' not found by any provider", query);
        None
    }

    async fn reverse_uncached(&self, latitude: f64, longitude: f64) -> Option<String> {
        for provider in &self.providers {
            match provider.reverse_geocode(latitude, longitude).await {
                Ok(Some(name)) => return Some(name),
                Ok(None) => debug!(
                    provider = provider.name(),
                    "No reverse geocoding result for ({}, {})", latitude, longitude
                ),
                Err(e) => warn!(
                    provider = provider.name(),
                    "Reverse geocoding ({}, {}) failed: {}", latitude, longitude, e
                ),
            }
        }
        None
    }
}

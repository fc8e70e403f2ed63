//! `WeatherHub` - location resolution and weather lookup
//!
//! Free-form location input (coordinates or place names) is resolved through a
//! chain of geocoding providers, then current conditions and a 5-day forecast are
//! fetched for it. Every stage degrades instead of failing: unnamed coordinates get
//! a coordinate-based name and unreachable weather providers yield synthetic data.

pub mod api;
pub mod assistant;
pub mod cache;
pub mod config;
pub mod error;
pub mod format;
pub mod geocoding;
pub mod http;
pub mod hub;
pub mod location_parser;
pub mod location_resolver;
pub mod logging;
pub mod models;
pub mod session;
pub mod storage;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use cache::TtlCache;
pub use config::HubConfig;
pub use error::WeatherHubError;
pub use geocoding::{GeocodingProvider, GeocodingResolver};
pub use hub::{Lookup, WeatherHub};
pub use location_parser::{LocationInput, LocationParser};
pub use location_resolver::LocationResolver;
pub use models::{CurrentConditions, DataSource, ForecastSeries, ResolvedLocation};
pub use session::{Session, SessionStore};
pub use storage::{RecordStore, WeatherRecord};
pub use weather::WeatherFetcher;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, WeatherHubError>;

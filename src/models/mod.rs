//! Data models for `WeatherHub`
//!
//! This module contains the core domain models organized by concern:
//! - Location: resolved coordinates with a display name
//! - Weather: current conditions and condition kinds
//! - Forecast: three-hourly forecast series

pub mod forecast;
pub mod location;
pub mod weather;

// Re-export all public types for convenient access
pub use forecast::{FORECAST_ENTRIES, FORECAST_STEP_HOURS, ForecastEntry, ForecastSeries};
pub use location::{ResolvedLocation, validate_coordinates};
pub use weather::{ConditionKind, CurrentConditions, DataSource};

//! Forecast series model

use super::{ConditionKind, DataSource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of entries in a full forecast (5 days of 3-hour steps)
pub const FORECAST_ENTRIES: usize = 40;

/// Spacing between forecast entries
pub const FORECAST_STEP_HOURS: i64 = 3;

/// A single forecast step
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ForecastEntry {
    pub time: DateTime<Utc>,
    /// Temperature in Celsius
    pub temperature_c: f64,
    pub condition: ConditionKind,
    /// Relative humidity percentage (0-100)
    pub humidity_pct: u8,
    /// Wind speed in m/s
    pub wind_speed_ms: f64,
}

/// Three-hourly forecast, ordered by time
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ForecastSeries {
    pub entries: Vec<ForecastEntry>,
    pub source: DataSource,
}

impl ForecastSeries {
    /// Create a series, sorting entries by time
    #[must_use]
    pub fn new(mut entries: Vec<ForecastEntry>, source: DataSource) -> Self {
        entries.sort_by_key(|entry| entry.time);
        Self { entries, source }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries covering the next `hours` hours from the first entry
    #[must_use]
    pub fn next_hours(&self, hours: i64) -> &[ForecastEntry] {
        let count = usize::try_from(hours / FORECAST_STEP_HOURS).unwrap_or(0);
        &self.entries[..count.min(self.entries.len())]
    }

    /// Highest and lowest temperature in the series
    #[must_use]
    pub fn temperature_range(&self) -> Option<(f64, f64)> {
        let mut temps = self.entries.iter().map(|entry| entry.temperature_c);
        let first = temps.next()?;
        Some(temps.fold((first, first), |(min, max), t| (min.min(t), max.max(t))))
    }
}

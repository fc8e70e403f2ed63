//! Saved weather records
//!
//! Records live in a fjall keyspace when one can be opened and in process memory
//! otherwise. The full record set is kept in memory and written back as a single
//! postcard blob after every change. If a write fails, the store keeps going in
//! memory for the rest of the process.

use chrono::{DateTime, NaiveDate, Utc};
use fjall::Keyspace;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::Mutex;
use tokio::task;
use tracing::{debug, info, warn};

use crate::models::{CurrentConditions, ResolvedLocation};
use crate::{Result, WeatherHubError};

const RECORDS_KEY: &[u8] = b"weather_records";

/// A saved snapshot of the weather at a location
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherRecord {
    pub id: u64,
    pub location_name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Celsius
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: u8,
    /// hPa
    pub pressure: u32,
    /// m/s
    pub wind_speed: f64,
    pub weather_condition: String,
    pub weather_description: String,
    pub timestamp: DateTime<Utc>,
    pub notes: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl WeatherRecord {
    /// Build an unsaved record from a lookup result
    #[must_use]
    pub fn snapshot(
        location: &ResolvedLocation,
        current: &CurrentConditions,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: 0,
            location_name: location.display_name().to_string(),
            latitude: location.latitude(),
            longitude: location.longitude(),
            temperature: current.temperature_c,
            feels_like: current.feels_like_c,
            humidity: current.humidity_pct,
            pressure: current.pressure_hpa,
            wind_speed: current.wind_speed_ms,
            weather_condition: current.condition.to_string(),
            weather_description: current.description.clone(),
            timestamp: Utc::now(),
            notes,
            updated_at: None,
        }
    }
}

/// Fields that can be changed on a saved record; `None` leaves a field untouched
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct RecordUpdate {
    pub location_name: Option<String>,
    pub temperature: Option<f64>,
    pub humidity: Option<u8>,
    pub weather_description: Option<String>,
    pub notes: Option<String>,
}

impl RecordUpdate {
    fn is_empty(&self) -> bool {
        self.location_name.is_none()
            && self.temperature.is_none()
            && self.humidity.is_none()
            && self.weather_description.is_none()
            && self.notes.is_none()
    }

    fn apply(self, record: &mut WeatherRecord) {
        if let Some(name) = self.location_name {
            record.location_name = name;
        }
        if let Some(temperature) = self.temperature {
            record.temperature = temperature;
        }
        if let Some(humidity) = self.humidity {
            record.humidity = humidity;
        }
        if let Some(description) = self.weather_description {
            record.weather_description = description;
        }
        if let Some(notes) = self.notes {
            record.notes = Some(notes);
        }
        record.updated_at = Some(Utc::now());
    }
}

/// Where records are currently kept
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Persistent,
    Memory,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RecordStats {
    pub total_records: usize,
    pub unique_locations: usize,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
    pub backend: StorageBackend,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredRecords {
    next_id: u64,
    records: Vec<WeatherRecord>,
}

struct State {
    data: StoredRecords,
    keyspace: Option<Keyspace>,
}

pub struct RecordStore {
    state: Mutex<State>,
}

fn read_blob(keyspace: Keyspace) -> Result<Option<Vec<u8>>> {
    Ok(keyspace.get(RECORDS_KEY.to_vec())?.map(|v| v.to_vec()))
}

impl RecordStore {
    /// Open the store at `path`, falling back to memory if the database cannot be opened
    pub async fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        match Self::open_persistent(&path).await {
            Ok((keyspace, data)) => {
                info!(
                    "Record store opened at {} with {} records",
                    path.display(),
                    data.records.len()
                );
                Self::with_state(State {
                    data,
                    keyspace: Some(keyspace),
                })
            }
            Err(e) => {
                warn!(
                    "Record store at {} unavailable, using in-memory storage: {}",
                    path.display(),
                    e
                );
                Self::in_memory()
            }
        }
    }

    /// A store that never touches disk
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_state(State {
            data: StoredRecords::default(),
            keyspace: None,
        })
    }

    fn with_state(state: State) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    async fn open_persistent(path: &Path) -> Result<(Keyspace, StoredRecords)> {
        let path = path.to_path_buf();
        let keyspace = task::spawn_blocking(move || -> Result<Keyspace> {
            let db = fjall::Database::builder(&path).open()?;
            Ok(db.keyspace("records", fjall::KeyspaceCreateOptions::default)?)
        })
        .await
        .map_err(join_error)??;

        let store = keyspace.clone();
        let data = match task::spawn_blocking(move || read_blob(store))
            .await
            .map_err(join_error)??
        {
            Some(bytes) => postcard::from_bytes(&bytes)?,
            None => StoredRecords::default(),
        };

        Ok((keyspace, data))
    }

    pub async fn backend(&self) -> StorageBackend {
        if self.state.lock().await.keyspace.is_some() {
            StorageBackend::Persistent
        } else {
            StorageBackend::Memory
        }
    }

    /// Save a new record and return its assigned id
    pub async fn create(&self, mut record: WeatherRecord) -> Result<u64> {
        let mut state = self.state.lock().await;
        state.data.next_id += 1;
        record.id = state.data.next_id;
        let id = record.id;
        state.data.records.push(record);
        Self::persist(&mut state).await;
        debug!("Created weather record {}", id);
        Ok(id)
    }

    /// All records, newest first
    pub async fn list(&self) -> Vec<WeatherRecord> {
        let state = self.state.lock().await;
        newest_first(state.data.records.iter())
    }

    pub async fn get(&self, id: u64) -> Option<WeatherRecord> {
        let state = self.state.lock().await;
        state.data.records.iter().find(|r| r.id == id).cloned()
    }

    /// Apply an update; `false` when no record has that id
    pub async fn update(&self, id: u64, update: RecordUpdate) -> Result<bool> {
        if update.is_empty() {
            return Err(WeatherHubError::validation("No fields to update"));
        }

        let mut state = self.state.lock().await;
        let Some(record) = state.data.records.iter_mut().find(|r| r.id == id) else {
            return Ok(false);
        };
        update.apply(record);
        Self::persist(&mut state).await;
        Ok(true)
    }

    /// Delete a record; `false` when no record has that id
    pub async fn delete(&self, id: u64) -> Result<bool> {
        let mut state = self.state.lock().await;
        let before = state.data.records.len();
        state.data.records.retain(|r| r.id != id);
        if state.data.records.len() == before {
            return Ok(false);
        }
        Self::persist(&mut state).await;
        Ok(true)
    }

    /// Records whose location name contains `name`, ignoring case
    pub async fn by_location(&self, name: &str) -> Vec<WeatherRecord> {
        let needle = name.to_lowercase();
        let state = self.state.lock().await;
        newest_first(
            state
                .data
                .records
                .iter()
                .filter(|r| r.location_name.to_lowercase().contains(&needle)),
        )
    }

    /// Records taken between `start` and `end`, both days included
    pub async fn by_date_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<WeatherRecord> {
        let state = self.state.lock().await;
        newest_first(state.data.records.iter().filter(|r| {
            let day = r.timestamp.date_naive();
            start <= day && day <= end
        }))
    }

    pub async fn stats(&self) -> RecordStats {
        let state = self.state.lock().await;
        let records = &state.data.records;

        let mut locations: Vec<&str> = records.iter().map(|r| r.location_name.as_str()).collect();
        locations.sort_unstable();
        locations.dedup();

        RecordStats {
            total_records: records.len(),
            unique_locations: locations.len(),
            oldest: records.iter().map(|r| r.timestamp).min(),
            newest: records.iter().map(|r| r.timestamp).max(),
            backend: if state.keyspace.is_some() {
                StorageBackend::Persistent
            } else {
                StorageBackend::Memory
            },
        }
    }

    /// Write the record set back; on failure drop to in-memory storage
    async fn persist(state: &mut State) {
        let Some(keyspace) = state.keyspace.clone() else {
            return;
        };

        if let Err(e) = Self::write_blob(keyspace, &state.data).await {
            warn!("Persisting records failed, switching to in-memory storage: {}", e);
            state.keyspace = None;
        }
    }

    async fn write_blob(keyspace: Keyspace, data: &StoredRecords) -> Result<()> {
        let bytes = postcard::to_stdvec(data)?;
        task::spawn_blocking(move || keyspace.insert(RECORDS_KEY.to_vec(), bytes))
            .await
            .map_err(join_error)??;
        Ok(())
    }
}

fn newest_first<'a>(records: impl Iterator<Item = &'a WeatherRecord>) -> Vec<WeatherRecord> {
    let mut records: Vec<WeatherRecord> = records.cloned().collect();
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
    records
}

fn join_error(err: task::JoinError) -> WeatherHubError {
    WeatherHubError::storage(format!("storage task failed: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConditionKind, DataSource};
    use chrono::Duration;

    fn conditions() -> CurrentConditions {
        CurrentConditions {
            temperature_c: 21.3,
            feels_like_c: 20.9,
            temp_min_c: 18.0,
            temp_max_c: 23.0,
            condition: ConditionKind::Clear,
            description: "clear sky".to_string(),
            humidity_pct: 40,
            wind_speed_ms: 3.5,
            pressure_hpa: 1018,
            visibility_m: None,
            observed_at: Utc::now(),
            source: DataSource::Live,
        }
    }

    fn record(name: &str, days_ago: i64) -> WeatherRecord {
        let location = ResolvedLocation::new(48.8566, 2.3522, name).unwrap();
        let mut record = WeatherRecord::snapshot(&location, &conditions(), None);
        record.timestamp = DateTime::from_timestamp(1_700_000_000, 0).unwrap() - Duration::days(days_ago);
        record
    }

    #[test]
    fn test_snapshot_copies_lookup() {
        let location = ResolvedLocation::new(48.8566, 2.3522, "Paris, France").unwrap();
        let record = WeatherRecord::snapshot(&location, &conditions(), Some("picnic".into()));
        assert_eq!(record.location_name, "Paris, France");
        assert_eq!(record.temperature, 21.3);
        assert_eq!(record.weather_condition, "Clear");
        assert_eq!(record.notes.as_deref(), Some("picnic"));
    }

    #[tokio::test]
    async fn test_crud_in_memory() {
        let store = RecordStore::in_memory();
        let first = store.create(record("Paris, France", 2)).await.unwrap();
        let second = store.create(record("London, UK", 1)).await.unwrap();
        assert_ne!(first, second);

        let listed = store.list().await;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second, "newest first");

        let update = RecordUpdate {
            notes: Some("windy".to_string()),
            ..RecordUpdate::default()
        };
        assert!(store.update(first, update).await.unwrap());
        let updated = store.get(first).await.unwrap();
        assert_eq!(updated.notes.as_deref(), Some("windy"));
        assert!(updated.updated_at.is_some());

        assert!(!store.update(999, RecordUpdate {
            notes: Some("x".into()),
            ..RecordUpdate::default()
        }).await.unwrap());
        assert!(store.update(first, RecordUpdate::default()).await.is_err());

        assert!(store.delete(first).await.unwrap());
        assert!(!store.delete(first).await.unwrap());
        assert!(store.get(first).await.is_none());
    }

    #[tokio::test]
    async fn test_filters_and_stats() {
        let store = RecordStore::in_memory();
        store.create(record("Paris, France", 10)).await.unwrap();
        store.create(record("Paris, Texas", 3)).await.unwrap();
        store.create(record("London, UK", 1)).await.unwrap();

        let paris = store.by_location("paris").await;
        assert_eq!(paris.len(), 2);
        assert_eq!(paris[0].location_name, "Paris, Texas");

        let base = DateTime::from_timestamp(1_700_000_000, 0).unwrap().date_naive();
        let recent = store
            .by_date_range(base - Duration::days(3), base - Duration::days(1))
            .await;
        assert_eq!(recent.len(), 2);

        let stats = store.stats().await;
        assert_eq!(stats.total_records, 3);
        assert_eq!(stats.unique_locations, 3);
        assert!(stats.oldest < stats.newest);
        assert_eq!(stats.backend, StorageBackend::Memory);
    }

    #[tokio::test]
    async fn test_persistent_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::open(dir.path().join("records")).await;
        assert_eq!(store.backend().await, StorageBackend::Persistent);

        let id = store.create(record("Berlin, Germany", 0)).await.unwrap();
        assert_eq!(store.get(id).await.unwrap().location_name, "Berlin, Germany");
        assert_eq!(store.stats().await.backend, StorageBackend::Persistent);
    }

    #[tokio::test]
    async fn test_unopenable_path_falls_back_to_memory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("not_a_directory");
        std::fs::write(&file, b"occupied").unwrap();

        let store = RecordStore::open(&file).await;
        assert_eq!(store.backend().await, StorageBackend::Memory);
        assert!(store.create(record("Oslo, Norway", 0)).await.is_ok());
        assert_eq!(store.list().await.len(), 1);
    }
}

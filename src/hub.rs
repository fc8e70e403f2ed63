//! The service object behind every front end
//!
//! [`WeatherHub`] wires the location resolver, weather fetcher, record store
//! and assistant together and runs the resolve-then-fetch chain.

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::assistant::{AskContext, Assistant};
use crate::config::HubConfig;
use crate::format;
use crate::geocoding::GeocodingResolver;
use crate::location_resolver::LocationResolver;
use crate::models::{CurrentConditions, ForecastSeries, ResolvedLocation};
use crate::session::{ChatRole, Session};
use crate::storage::RecordStore;
use crate::weather::WeatherFetcher;
use crate::Result;

/// A resolved location with its weather
#[derive(Debug, Serialize, Clone)]
pub struct Lookup {
    pub location: ResolvedLocation,
    pub current: CurrentConditions,
    pub forecast: ForecastSeries,
}

pub struct WeatherHub {
    resolver: LocationResolver,
    weather: WeatherFetcher,
    records: RecordStore,
    assistant: Assistant,
}

impl WeatherHub {
    #[must_use]
    pub fn new(
        resolver: LocationResolver,
        weather: WeatherFetcher,
        records: RecordStore,
        assistant: Assistant,
    ) -> Self {
        Self {
            resolver,
            weather,
            records,
            assistant,
        }
    }

    /// Build every component from configuration
    pub async fn from_config(config: &HubConfig) -> Result<Self> {
        let geocoder = GeocodingResolver::from_config(&config.geocoding, config.cache.geocode_ttl())?;
        info!("Geocoding providers: {:?}", geocoder.provider_names());

        let weather = WeatherFetcher::from_config(&config.weather, config.cache.weather_ttl())?;
        let records = RecordStore::open(&config.storage.path).await;
        let assistant = Assistant::from_config(&config.assistant)?;

        Ok(Self::new(LocationResolver::new(geocoder), weather, records, assistant))
    }

    /// Resolve free-form input without fetching weather
    pub async fn locate(&self, query: &str) -> Result<Option<ResolvedLocation>> {
        self.resolver.resolve(query).await
    }

    /// Name a coordinate pair, as for a map click
    pub async fn place_name(&self, latitude: f64, longitude: f64) -> Result<ResolvedLocation> {
        self.resolver.name_coordinates(latitude, longitude).await
    }

    /// Resolve input and fetch its weather
    ///
    /// `Ok(None)` when the place could not be found. Weather is always present
    /// for a resolved location, live or synthetic.
    #[instrument(level = "debug", skip(self))]
    pub async fn lookup(&self, query: &str) -> Result<Option<Lookup>> {
        let Some(location) = self.locate(query).await? else {
            return Ok(None);
        };
        Ok(Some(self.weather_for(location).await))
    }

    /// Name a coordinate pair and fetch its weather
    pub async fn lookup_point(&self, latitude: f64, longitude: f64) -> Result<Lookup> {
        let location = self.place_name(latitude, longitude).await?;
        Ok(self.weather_for(location).await)
    }

    async fn weather_for(&self, location: ResolvedLocation) -> Lookup {
        let (lat, lon) = (location.latitude(), location.longitude());
        let (current, forecast) = tokio::join!(self.weather.current(lat, lon), self.weather.forecast(lat, lon));
        debug!("{}: {}", location.display_name(), format::summary(&current));
        Lookup {
            location,
            current,
            forecast,
        }
    }

    /// Look up a query and remember the result in the session
    pub async fn session_lookup(&self, session: &mut Session, query: &str) -> Result<Option<Lookup>> {
        let lookup = self.lookup(query).await?;
        if let Some(lookup) = &lookup {
            session.record_lookup(
                lookup.location.clone(),
                lookup.current.clone(),
                lookup.forecast.clone(),
            );
        }
        Ok(lookup)
    }

    /// Handle a map click: remember the point and look up its weather
    pub async fn session_map_click(
        &self,
        session: &mut Session,
        latitude: f64,
        longitude: f64,
    ) -> Result<Lookup> {
        let lookup = self.lookup_point(latitude, longitude).await?;
        session.last_map_click = Some((latitude, longitude));
        session.record_lookup(
            lookup.location.clone(),
            lookup.current.clone(),
            lookup.forecast.clone(),
        );
        Ok(lookup)
    }

    /// Answer a question against the session's latest lookup
    pub async fn ask(&self, session: &mut Session, question: &str) -> String {
        let context = match (&session.last_location, &session.last_current) {
            (Some(location), Some(current)) => Some(AskContext {
                location,
                current,
                forecast: session.last_forecast.as_ref(),
            }),
            _ => None,
        };

        let answer = self.assistant.answer(question, context).await;
        session.push_turn(ChatRole::User, question);
        session.push_turn(ChatRole::Assistant, answer.clone());
        answer
    }

    /// Short remarks on the session's latest lookup, `None` before any lookup
    pub async fn insights(&self, session: &Session) -> Option<String> {
        let current = session.last_current.as_ref()?;
        Some(self.assistant.insights(current, session.last_forecast.as_ref()).await)
    }

    /// Activity suggestions for the session's latest lookup, `None` before any lookup
    pub async fn activities(&self, session: &Session) -> Option<String> {
        let current = session.last_current.as_ref()?;
        Some(self.assistant.activities(current).await)
    }

    #[must_use]
    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    #[must_use]
    pub fn resolver(&self) -> &LocationResolver {
        &self.resolver
    }

    #[must_use]
    pub fn weather(&self) -> &WeatherFetcher {
        &self.weather
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocoding::{GeocodingProvider, NominatimGeocoder};
    use crate::models::DataSource;
    use crate::WeatherHubError;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn hub(server: &MockServer) -> WeatherHub {
        let client = crate::http::build_client(Duration::from_secs(2), "weatherhub-test").unwrap();
        let providers: Vec<Box<dyn GeocodingProvider>> =
            vec![Box::new(NominatimGeocoder::new(client, &server.uri()))];
        WeatherHub::new(
            LocationResolver::new(GeocodingResolver::new(providers, Duration::from_secs(3600))),
            WeatherFetcher::new(None, Duration::from_secs(1800)),
            RecordStore::in_memory(),
            Assistant::simple(),
        )
    }

    async fn mount_paris(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "lat": "48.8566", "lon": "2.3522", "display_name": "Paris, France"
            }])))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_lookup_place() {
        let server = MockServer::start().await;
        mount_paris(&server).await;

        let lookup = hub(&server).lookup("Paris").await.unwrap().unwrap();
        assert_eq!(lookup.location.display_name(), "Paris, France");
        assert_eq!(lookup.current.source, DataSource::Synthetic);
        assert_eq!(lookup.forecast.len(), crate::models::FORECAST_ENTRIES);
    }

    #[tokio::test]
    async fn test_lookup_errors_and_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let hub = hub(&server);
        assert!(matches!(hub.lookup("").await, Err(WeatherHubError::EmptyInput)));
        assert!(hub.lookup("Xyzzyville").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_session_flow() {
        let server = MockServer::start().await;
        mount_paris(&server).await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let hub = hub(&server);
        let mut session = Session::new();
        assert!(hub.insights(&session).await.is_none());
        assert!(hub.activities(&session).await.is_none());

        let answer = hub.ask(&mut session, "Is it warm?").await;
        assert!(answer.contains("don't currently have weather data"));

        hub.session_lookup(&mut session, "Paris").await.unwrap();
        let answer = hub.ask(&mut session, "Is it warm?").await;
        assert!(answer.contains("Paris, France"));
        assert_eq!(session.chat_history.len(), 4);
        assert!(hub.insights(&session).await.is_some());
        assert!(hub.activities(&session).await.is_some_and(|text| text.contains('•')));

        let lookup = hub.session_map_click(&mut session, 45.0, 7.0).await.unwrap();
        assert_eq!(lookup.location.display_name(), "Location (45.0000, 7.0000)");
        assert_eq!(session.last_map_click, Some((45.0, 7.0)));
        assert_eq!(
            session.last_location.as_ref().map(ResolvedLocation::display_name),
            Some("Location (45.0000, 7.0000)")
        );
    }
}

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::WeatherHubError;
use crate::hub::{Lookup, WeatherHub};
use crate::models::ResolvedLocation;
use crate::session::SessionStore;
use crate::storage::{RecordStats, RecordUpdate, StorageBackend, WeatherRecord};

#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<WeatherHub>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    #[must_use]
    pub fn new(hub: Arc<WeatherHub>) -> Self {
        Self {
            hub,
            sessions: Arc::new(SessionStore::new()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Hub(WeatherHubError),
}

impl From<WeatherHubError> for ApiError {
    fn from(err: WeatherHubError) -> Self {
        Self::Hub(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Hub(err) if err.is_user_error() => (StatusCode::BAD_REQUEST, err.user_message()),
            ApiError::Hub(err) => {
                error!("Request failed: {}", err);
                let status = match err {
                    WeatherHubError::Api { .. } => StatusCode::BAD_GATEWAY,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.user_message())
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub geocoders: Vec<String>,
    pub live_weather: bool,
    pub storage: StorageBackend,
}

#[derive(Deserialize)]
struct LookupParams {
    q: String,
}

#[derive(Deserialize)]
struct ReverseParams {
    lat: f64,
    lng: f64,
}

/// Either a free-form query or a map click
#[derive(Deserialize)]
struct SessionLookupRequest {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
}

#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

#[derive(Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
}

#[derive(Serialize, Deserialize)]
pub struct AdviceResponse {
    pub text: String,
}

#[derive(Deserialize)]
struct RecordFilter {
    location: Option<String>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

#[derive(Deserialize)]
struct CreateRecordRequest {
    query: String,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct CreatedRecord {
    pub id: u64,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/lookup", get(lookup))
        .route("/reverse", get(reverse))
        .route("/sessions/{id}/lookup", post(session_lookup))
        .route("/sessions/{id}/ask", post(session_ask))
        .route("/sessions/{id}/insights", get(session_insights))
        .route("/sessions/{id}/activities", get(session_activities))
        .route("/sessions/{id}", axum::routing::delete(end_session))
        .route("/records", get(list_records).post(create_record))
        .route("/records/stats", get(record_stats))
        .route(
            "/records/{id}",
            get(get_record).put(update_record).delete(delete_record),
        )
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let geocoders = state
        .hub
        .resolver()
        .geocoder()
        .provider_names()
        .into_iter()
        .map(str::to_string)
        .collect();

    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        geocoders,
        live_weather: state.hub.weather().has_provider(),
        storage: state.hub.records().backend().await,
    })
}

fn not_found(query: &str) -> ApiError {
    ApiError::NotFound(format!("Location '{}' not found", query.trim()))
}

async fn lookup(
    State(state): State<AppState>,
    Query(params): Query<LookupParams>,
) -> ApiResult<Json<Lookup>> {
    let lookup = state
        .hub
        .lookup(&params.q)
        .await?
        .ok_or_else(|| not_found(&params.q))?;
    Ok(Json(lookup))
}

async fn reverse(
    State(state): State<AppState>,
    Query(params): Query<ReverseParams>,
) -> ApiResult<Json<ResolvedLocation>> {
    Ok(Json(state.hub.place_name(params.lat, params.lng).await?))
}

async fn session_lookup(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SessionLookupRequest>,
) -> ApiResult<Json<Lookup>> {
    let session = state.sessions.get_or_create(&id).await;
    let mut session = session.lock().await;

    let lookup = match (req.query, req.latitude, req.longitude) {
        (Some(query), None, None) => state
            .hub
            .session_lookup(&mut session, &query)
            .await?
            .ok_or_else(|| not_found(&query))?,
        (None, Some(lat), Some(lng)) => state.hub.session_map_click(&mut session, lat, lng).await?,
        _ => {
            return Err(ApiError::BadRequest(
                "Provide either a query or both latitude and longitude".to_string(),
            ));
        }
    };
    Ok(Json(lookup))
}

async fn session_ask(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AskRequest>,
) -> ApiResult<Json<AskResponse>> {
    if req.question.trim().is_empty() {
        return Err(ApiError::BadRequest("Question cannot be empty".to_string()));
    }

    let session = state.sessions.get_or_create(&id).await;
    let mut session = session.lock().await;
    let answer = state.hub.ask(&mut session, req.question.trim()).await;
    Ok(Json(AskResponse { answer }))
}

fn no_lookup_yet(id: &str) -> ApiError {
    ApiError::NotFound(format!("Session '{id}' has no weather lookup yet"))
}

async fn session_insights(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<AdviceResponse>> {
    let session = state.sessions.get_or_create(&id).await;
    let session = session.lock().await;
    let text = state.hub.insights(&session).await.ok_or_else(|| no_lookup_yet(&id))?;
    Ok(Json(AdviceResponse { text }))
}

async fn session_activities(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<AdviceResponse>> {
    let session = state.sessions.get_or_create(&id).await;
    let session = session.lock().await;
    let text = state.hub.activities(&session).await.ok_or_else(|| no_lookup_yet(&id))?;
    Ok(Json(AdviceResponse { text }))
}

async fn end_session(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    if state.sessions.remove(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Session '{id}' not found")))
    }
}

async fn list_records(
    State(state): State<AppState>,
    Query(filter): Query<RecordFilter>,
) -> ApiResult<Json<Vec<WeatherRecord>>> {
    let records = state.hub.records();
    let list = match (filter.location, filter.from, filter.to) {
        (Some(name), None, None) => records.by_location(&name).await,
        (None, Some(from), Some(to)) => {
            if from > to {
                return Err(ApiError::BadRequest("'from' must not be after 'to'".to_string()));
            }
            records.by_date_range(from, to).await
        }
        (None, None, None) => records.list().await,
        _ => {
            return Err(ApiError::BadRequest(
                "Filter by location, or by both from and to".to_string(),
            ));
        }
    };
    Ok(Json(list))
}

async fn create_record(
    State(state): State<AppState>,
    Json(req): Json<CreateRecordRequest>,
) -> ApiResult<(StatusCode, Json<CreatedRecord>)> {
    let lookup = state
        .hub
        .lookup(&req.query)
        .await?
        .ok_or_else(|| not_found(&req.query))?;

    let record = WeatherRecord::snapshot(&lookup.location, &lookup.current, req.notes);
    let id = state.hub.records().create(record).await?;
    Ok((StatusCode::CREATED, Json(CreatedRecord { id })))
}

async fn record_stats(State(state): State<AppState>) -> Json<RecordStats> {
    Json(state.hub.records().stats().await)
}

fn record_not_found(id: u64) -> ApiError {
    ApiError::NotFound(format!("Record {id} not found"))
}

async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<WeatherRecord>> {
    state
        .hub
        .records()
        .get(id)
        .await
        .map(Json)
        .ok_or_else(|| record_not_found(id))
}

async fn update_record(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(update): Json<RecordUpdate>,
) -> ApiResult<Json<WeatherRecord>> {
    let records = state.hub.records();
    if !records.update(id, update).await? {
        return Err(record_not_found(id));
    }
    records.get(id).await.map(Json).ok_or_else(|| record_not_found(id))
}

async fn delete_record(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult<StatusCode> {
    if state.hub.records().delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(record_not_found(id))
    }
}

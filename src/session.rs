//! Per-session context
//!
//! Each session keeps the latest lookup, the last map click and the chat
//! history. Sessions are independent: nothing is shared between them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::models::{CurrentConditions, ForecastSeries, ResolvedLocation};

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Serialize, Clone)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Default, Clone)]
pub struct Session {
    pub chat_history: Vec<ChatTurn>,
    pub last_location: Option<ResolvedLocation>,
    pub last_current: Option<CurrentConditions>,
    pub last_forecast: Option<ForecastSeries>,
    /// Raw coordinates of the last map click
    pub last_map_click: Option<(f64, f64)>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_turn(&mut self, role: ChatRole, content: impl Into<String>) {
        self.chat_history.push(ChatTurn {
            role,
            content: content.into(),
            at: Utc::now(),
        });
    }

    /// Remember a completed lookup
    pub fn record_lookup(
        &mut self,
        location: ResolvedLocation,
        current: CurrentConditions,
        forecast: ForecastSeries,
    ) {
        self.last_location = Some(location);
        self.last_current = Some(current);
        self.last_forecast = Some(forecast);
    }

    /// Clear everything, as at session start
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Sessions by id, created on first use
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The session for `id`, starting a fresh one if needed
    pub async fn get_or_create(&self, id: &str) -> Arc<Mutex<Session>> {
        let mut sessions = self.sessions.lock().await;
        Arc::clone(sessions.entry(id.to_string()).or_insert_with(|| {
            debug!("Starting session {}", id);
            Arc::new(Mutex::new(Session::new()))
        }))
    }

    /// Drop a session; `false` when it did not exist
    pub async fn remove(&self, id: &str) -> bool {
        self.sessions.lock().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

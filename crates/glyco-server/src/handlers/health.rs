//! Health handler

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::{narrator_mode, AppState};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// templated or delegated
    pub narrator: String,
    /// Text backend host when delegating
    pub backend: Option<String>,
    pub model: Option<String>,
    pub active_sessions: usize,
}

/// GET /api/health - Liveness and narrator configuration
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let narrator = state.agent.narrator();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        narrator: narrator_mode(&state).to_string(),
        backend: narrator.backend_host().map(String::from),
        model: narrator.backend_model().map(String::from),
        active_sessions: state.sessions.active_count().await,
    })
}

//! Entry handlers - submit a daily log, list history, weekly trend

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use chrono::Local;

use super::session::require_session;
use crate::{AppError, AppState};
use glyco_core::{Assessment, Entry, EntryForm, WeeklyTrend};

/// POST /api/session/:id/entries - Submit today's log and get the assessment
pub async fn submit_entry(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    payload: Result<Json<EntryForm>, JsonRejection>,
) -> Result<Json<Assessment>, AppError> {
    let session = require_session(&state, &session_id).await?;
    let Json(form) = payload.map_err(|e| AppError::bad_request(&e.body_text()))?;

    let today = Local::now().date_naive();
    let assessment = state
        .agent
        .submit(&session.profile, form, today)
        .await
        .map_err(AppError::from_core)?;

    state
        .sessions
        .record_assessment(&session_id, assessment.clone())
        .await;

    Ok(Json(assessment))
}

/// GET /api/session/:id/entries - Full history, oldest first
pub async fn list_entries(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<Entry>>, AppError> {
    let session = require_session(&state, &session_id).await?;
    Ok(Json(state.agent.history(&session.profile)))
}

/// GET /api/session/:id/trend - Weekly means, or null with too few entries
pub async fn get_trend(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<Option<WeeklyTrend>>, AppError> {
    let session = require_session(&state, &session_id).await?;
    Ok(Json(state.agent.trend(&session.profile)))
}

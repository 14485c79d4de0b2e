//! Download handlers - PDF report and history export

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, Response, StatusCode},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use super::session::require_session;
use crate::{AppError, AppState};
use glyco_core::{ExportFormat, HistoryExportOptions};

/// GET /api/session/:id/report - Render and download the PDF report
pub async fn download_report(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Response<Body>, AppError> {
    let session = require_session(&state, &session_id).await?;

    let path = state
        .agent
        .report(&session.profile)
        .map_err(AppError::from_core)?;
    let bytes = tokio::fs::read(&path).await?;

    info!(user = %session.profile.key, bytes = bytes.len(), "Report downloaded");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"{}_report.pdf\"",
                session.profile.key
            ),
        )
        .body(Body::from(bytes))
        .map_err(|e| AppError::internal(&e.to_string()))
}

/// Query parameters for history export
#[derive(Debug, Deserialize)]
pub struct HistoryExportQuery {
    /// Output format (default: csv)
    #[serde(default = "default_format")]
    pub format: String,
    /// Start date (YYYY-MM-DD)
    pub from: Option<String>,
    /// End date (YYYY-MM-DD)
    pub to: Option<String>,
    /// Only the most recent N entries
    pub last: Option<usize>,
}

fn default_format() -> String {
    "csv".to_string()
}

fn parse_date(value: Option<String>, field: &str) -> Result<Option<NaiveDate>, AppError> {
    value
        .map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d"))
        .transpose()
        .map_err(|_| AppError::bad_request(&format!("Invalid '{}' date format (use YYYY-MM-DD)", field)))
}

/// GET /api/session/:id/export - Export history as CSV or JSON
pub async fn export_history(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Query(params): Query<HistoryExportQuery>,
) -> Result<Response<Body>, AppError> {
    let session = require_session(&state, &session_id).await?;

    let format: ExportFormat = params
        .format
        .parse()
        .map_err(|_| AppError::bad_request("Invalid format. Use 'csv' or 'json'"))?;

    let opts = HistoryExportOptions {
        from: parse_date(params.from, "from")?,
        to: parse_date(params.to, "to")?,
        last: params.last,
    };

    let body = state
        .agent
        .export(&session.profile, format, &opts)
        .map_err(AppError::from_core)?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, format.content_type())
        .header(
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"{}\"",
                format.file_name(&session.profile.key)
            ),
        )
        .body(Body::from(body))
        .map_err(|e| AppError::internal(&e.to_string()))
}

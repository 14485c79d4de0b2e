//! Glyco Web Server
//!
//! Axum-based REST API for the Glyco daily glucose support log.
//!
//! The API is a thin session shell around `glyco_core::Agent`: log in by
//! name, submit daily entries, read the assessment and history, download
//! the PDF report or a CSV/JSON export, and log out.
//!
//! There is no authentication: a session is just a remembered name. Do not
//! expose the server beyond a trusted network.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, warn};

use glyco_core::{
    default_data_dir, Agent, NarrativeMode, NarrativeStrategy, Policy, TextBackend,
};

mod handlers;

pub use handlers::{SessionManager, SESSION_TIMEOUT};

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
    /// Root of history, report and override files
    pub data_dir: PathBuf,
    /// Rule thresholds, penalties and windows
    pub policy: Policy,
    /// Narrative strategy shared by all sessions
    pub narrator: NarrativeStrategy,
    /// Static files served for paths outside `/api`
    pub static_dir: Option<PathBuf>,
    /// Idle time after which a session is forgotten
    pub session_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![],
            data_dir: default_data_dir(),
            policy: Policy::default(),
            narrator: NarrativeStrategy::templated(),
            static_dir: None,
            session_timeout: SESSION_TIMEOUT,
        }
    }
}

/// Shared application state
pub struct AppState {
    pub agent: Agent,
    pub sessions: SessionManager,
}

/// Create the application router
pub fn create_router(config: ServerConfig) -> Router {
    let agent = Agent::in_data_dir(&config.data_dir, config.policy.clone(), config.narrator.clone());

    info!(
        data_dir = %config.data_dir.display(),
        narrator = %agent.narrator().mode(),
        "Glyco API configured"
    );

    let state = Arc::new(AppState {
        agent,
        sessions: SessionManager::with_timeout(config.session_timeout),
    });

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        // Login / logout
        .route("/session", post(handlers::login))
        .route(
            "/session/:id",
            get(handlers::get_session).delete(handlers::logout),
        )
        // Entries and results
        .route(
            "/session/:id/entries",
            get(handlers::list_entries).post(handlers::submit_entry),
        )
        .route("/session/:id/trend", get(handlers::get_trend))
        // Downloads
        .route("/session/:id/report", get(handlers::download_report))
        .route("/session/:id/export", get(handlers::export_history));

    // Build CORS layer
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    };

    let csp_value = HeaderValue::from_static(
        "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'; img-src 'self' data:; font-src 'self'; connect-src 'self'; frame-ancestors 'none'"
    );

    let mut app = Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            csp_value,
        ));

    if let Some(dir) = &config.static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

/// Start the server with default configuration
pub async fn serve(host: &str, port: u16) -> anyhow::Result<()> {
    serve_with_config(host, port, ServerConfig::default()).await
}

/// Start the server with custom configuration
pub async fn serve_with_config(host: &str, port: u16, config: ServerConfig) -> anyhow::Result<()> {
    check_narrator(&config.narrator).await;

    let app = create_router(config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);
    warn!("⚠️  No authentication - sessions are a remembered name only");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Log narrator mode and, when delegating, whether the backend answers
async fn check_narrator(narrator: &NarrativeStrategy) {
    match narrator {
        NarrativeStrategy::Templated(_) => {
            info!("ℹ️  Narrative mode: templated (set NARRATIVE_MODE=delegated to use a model)");
        }
        NarrativeStrategy::Delegated(n) => {
            let client = n.client();
            if client.health_check().await {
                info!(
                    "✅ Narrative backend connected: {} (model: {})",
                    client.host(),
                    client.model()
                );
            } else {
                warn!(
                    "⚠️  Narrative backend not responding: {} (templated text will be used on failure)",
                    client.host()
                );
            }
        }
    }
}

/// Narrator mode label for status output
pub(crate) fn narrator_mode(state: &AppState) -> NarrativeMode {
    state.agent.narrator().mode()
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }

    /// Map a core error: invalid input is the caller's fault, the rest is ours
    pub fn from_core(err: glyco_core::Error) -> Self {
        match err {
            glyco_core::Error::InvalidData(msg) => Self::bad_request(&msg),
            other => Self::from(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}

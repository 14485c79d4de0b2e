//! Test utilities for glyco-core
//!
//! A mock Ollama server for exercising the real HTTP backend in tests and
//! during development without a model installed.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

/// Reply to "today" prompts
pub const MOCK_NARRATIVE: &str =
    "Your readings have been a little uneven. Regular meals and sleep should help.";

/// Reply to "tomorrow" prompts
pub const MOCK_PLAN: &str = "- Walk for 15 minutes after dinner\n- Go to bed 30 minutes earlier";

#[derive(Clone, Copy)]
enum Behavior {
    Answer,
    Blank,
    Fail,
}

struct MockState {
    behavior: Behavior,
    requests: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

/// Mock Ollama server for testing and development
pub struct MockOllamaServer {
    addr: SocketAddr,
    state: Arc<MockState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockOllamaServer {
    /// Start a server that answers every generate call
    pub async fn start() -> Self {
        Self::start_with(Behavior::Answer).await
    }

    /// Start a server whose generate endpoint returns HTTP 500
    pub async fn start_failing() -> Self {
        Self::start_with(Behavior::Fail).await
    }

    /// Start a server whose generate endpoint returns whitespace
    pub async fn start_blank() -> Self {
        Self::start_with(Behavior::Blank).await
    }

    async fn start_with(behavior: Behavior) -> Self {
        let state = Arc::new(MockState {
            behavior,
            requests: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        });

        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of generate requests received
    pub fn request_count(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    /// Prompt of the most recent generate request
    pub fn last_prompt(&self) -> Option<String> {
        self.state.last_prompt.lock().unwrap().clone()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockOllamaServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Ollama tags endpoint response (health check)
async fn handle_tags() -> Json<TagsResponse> {
    Json(TagsResponse {
        models: vec![ModelInfo {
            name: "llama3.2:latest".to_string(),
            modified_at: "2026-01-01T00:00:00Z".to_string(),
            size: 2_000_000_000,
        }],
    })
}

/// Ollama generate endpoint
async fn handle_generate(
    State(state): State<Arc<MockState>>,
    Json(request): Json<GenerateRequest>,
) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    *state.last_prompt.lock().unwrap() = Some(request.prompt.clone());

    let response = match state.behavior {
        Behavior::Fail => {
            return (StatusCode::INTERNAL_SERVER_ERROR, "model crashed").into_response();
        }
        Behavior::Blank => "   ".to_string(),
        // Matches the wording of prompts/plan_tomorrow.md
        Behavior::Answer if request.prompt.contains("plan for tomorrow") => MOCK_PLAN.to_string(),
        Behavior::Answer => format!("\"{}\"", MOCK_NARRATIVE),
    };

    Json(GenerateResponse {
        model: request.model,
        response,
        done: true,
    })
    .into_response()
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    #[allow(dead_code)]
    #[serde(default)]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    model: String,
    response: String,
    done: bool,
}

#[derive(Debug, Serialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
struct ModelInfo {
    name: String,
    modified_at: String,
    size: u64,
}

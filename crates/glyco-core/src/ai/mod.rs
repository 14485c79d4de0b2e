//! Pluggable text-generation backends
//!
//! The narrative generator can delegate phrasing to an external language
//! model. This module hides which server does the generating.
//!
//! # Architecture
//!
//! - `TextBackend` trait: one-shot prompt in, text out
//! - `TextClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OllamaBackend`, `OpenAICompatibleBackend`, `MockBackend`
//!
//! Calls are single-shot: no retries and no streaming. Callers decide what
//! to do with a failure (the narrator falls back to templates).
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (ollama, openai_compatible, mock). Default: ollama
//! - `OLLAMA_HOST`: Ollama server URL (required for ollama backend)
//! - `OLLAMA_MODEL`: Model name (default: llama3.2)
//! - `OPENAI_COMPATIBLE_HOST`: Server URL (required for openai_compatible backend)
//! - `OPENAI_COMPATIBLE_MODEL`: Model name (default: gpt-3.5-turbo)
//! - `OPENAI_COMPATIBLE_API_KEY`: API key if required (optional)
//! - `NARRATIVE_TIMEOUT_SECS`: Per-request timeout (default: 20)

mod mock;
mod ollama;
mod openai_compatible;
pub mod parsing;

pub use mock::MockBackend;
pub use ollama::OllamaBackend;
pub use openai_compatible::OpenAICompatibleBackend;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Default per-request timeout for text generation
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Timeout from `NARRATIVE_TIMEOUT_SECS`, or the default
pub fn timeout_from_env() -> Duration {
    std::env::var("NARRATIVE_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_TIMEOUT)
}

/// Interface shared by all text-generation backends
#[async_trait]
pub trait TextBackend: Send + Sync {
    /// Generate text for a prompt (one call, no retries)
    ///
    /// Returns the cleaned text; blank output is an error.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Model name (for logging)
    fn model(&self) -> &str;

    /// Host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete text client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum TextClient {
    /// Ollama backend (HTTP API)
    Ollama(OllamaBackend),
    /// OpenAI-compatible backend (vLLM, LocalAI, llama-server, hosted APIs, etc.)
    OpenAICompatible(OpenAICompatibleBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl TextClient {
    /// Create a text client from environment variables
    ///
    /// Checks `AI_BACKEND` to determine which backend to use. Returns None if
    /// the required host variable for that backend is not set.
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("AI_BACKEND").unwrap_or_else(|_| "ollama".to_string());

        match backend.to_lowercase().as_str() {
            "ollama" => OllamaBackend::from_env().map(TextClient::Ollama),
            "openai_compatible" | "openai" | "vllm" | "localai" | "llamacpp" => {
                OpenAICompatibleBackend::from_env().map(TextClient::OpenAICompatible)
            }
            "mock" => Some(TextClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown AI_BACKEND, falling back to ollama");
                OllamaBackend::from_env().map(TextClient::Ollama)
            }
        }
    }

    /// Create an Ollama backend directly
    pub fn ollama(host: &str, model: &str) -> Self {
        TextClient::Ollama(OllamaBackend::new(host, model))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        TextClient::Mock(MockBackend::new())
    }
}

// Implement TextBackend for TextClient by delegating to the inner backend
#[async_trait]
impl TextBackend for TextClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        match self {
            TextClient::Ollama(b) => b.generate(prompt).await,
            TextClient::OpenAICompatible(b) => b.generate(prompt).await,
            TextClient::Mock(b) => b.generate(prompt).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            TextClient::Ollama(b) => b.health_check().await,
            TextClient::OpenAICompatible(b) => b.health_check().await,
            TextClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            TextClient::Ollama(b) => b.model(),
            TextClient::OpenAICompatible(b) => b.model(),
            TextClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            TextClient::Ollama(b) => b.host(),
            TextClient::OpenAICompatible(b) => b.host(),
            TextClient::Mock(b) => b.host(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_client_mock() {
        let client = TextClient::mock();
        assert_eq!(client.model(), "mock");
        assert_eq!(client.host(), "mock://localhost");
    }

    #[tokio::test]
    async fn test_mock_health_check() {
        let client = TextClient::mock();
        assert!(client.health_check().await);
    }

    #[tokio::test]
    async fn test_mock_generate() {
        let client = TextClient::mock();
        let text = client.generate("Say something kind").await.unwrap();
        assert!(!text.is_empty());
    }

    #[tokio::test]
    async fn test_ollama_against_mock_server() {
        let server = crate::test_utils::MockOllamaServer::start().await;
        let client = TextClient::ollama(&server.url(), "llama3.2");

        assert!(client.health_check().await);
        let text = client.generate("Explain today's readings").await.unwrap();
        assert!(!text.is_empty());
        assert!(!text.starts_with('"'));
    }

    #[tokio::test]
    async fn test_ollama_unreachable_is_error() {
        // Port 9 (discard) on localhost is not an Ollama server
        let client = TextClient::Ollama(
            OllamaBackend::new("http://127.0.0.1:9", "llama3.2")
                .with_timeout(Duration::from_millis(500)),
        );
        assert!(!client.health_check().await);
        assert!(client.generate("hello").await.is_err());
    }
}

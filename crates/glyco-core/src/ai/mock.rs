//! Mock backend for testing
//!
//! Provides predictable text for narrative tests and development without a
//! running model server. Can be configured to fail every call.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::parsing::clean_generated_text;
use super::TextBackend;

/// Reply used when no custom reply is configured
pub const MOCK_REPLY: &str =
    "Your recent readings look manageable. Keep your sleep and meals regular.";

/// Mock text backend for testing
#[derive(Clone)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    /// Reply text; `None` makes every call fail
    reply: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend (healthy, fixed reply)
    pub fn new() -> Self {
        Self {
            healthy: true,
            reply: Some(MOCK_REPLY.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Mock that returns `reply` for every prompt
    pub fn with_reply(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            ..Self::new()
        }
    }

    /// Mock whose every call fails
    pub fn failing() -> Self {
        Self {
            healthy: false,
            reply: None,
            ..Self::new()
        }
    }

    /// Number of generate calls made (shared across clones)
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextBackend for MockBackend {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.reply {
            Some(ref reply) => clean_generated_text(reply),
            None => Err(Error::Backend("mock backend configured to fail".into())),
        }
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_failing_mock_counts_calls() {
        let mock = MockBackend::failing();
        let observer = mock.clone();

        assert!(mock.generate("a").await.is_err());
        assert!(mock.generate("b").await.is_err());
        assert_eq!(observer.call_count(), 2);
        assert!(!mock.health_check().await);
    }

    #[tokio::test]
    async fn test_blank_reply_is_error() {
        let mock = MockBackend::with_reply("   \n ");
        assert!(mock.generate("a").await.is_err());
    }
}

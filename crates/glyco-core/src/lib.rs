//! Glyco Core Library
//!
//! Shared functionality for the Glyco daily glucose support log:
//! - Entry, profile and assessment models
//! - Per-user JSON history store
//! - Rule engine (pattern, confidence, focus tips, weekly trend)
//! - Configurable policy table
//! - Narrative generation, templated or via a pluggable text backend
//! - Prompt library for customizable backend prompts
//! - PDF report and CSV/JSON history export

pub mod agent;
pub mod ai;
pub mod error;
pub mod export;
pub mod models;
pub mod narrative;
pub mod policy;
pub mod prompts;
pub mod report;
pub mod rules;
pub mod store;

/// Test utilities including mock Ollama server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use agent::Agent;
pub use ai::{MockBackend, OllamaBackend, OpenAICompatibleBackend, TextBackend, TextClient};
pub use error::{Error, Result};
pub use export::{ExportFormat, HistoryExportOptions};
pub use models::{
    Activity, Assessment, Entry, EntryForm, Medication, Mood, Pattern, UserProfile, WeeklyTrend,
};
pub use narrative::{
    DelegatedNarrator, NarrativeConfig, NarrativeMode, NarrativeRequest, NarrativeStrategy,
    Narrator, TemplatedNarrator,
};
pub use policy::Policy;
pub use prompts::{Prompt, PromptId, PromptLibrary};
pub use report::ReportExporter;
pub use rules::RuleEngine;
pub use store::{default_data_dir, storage_key, HistoryStore};

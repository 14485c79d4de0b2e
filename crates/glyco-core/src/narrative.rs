//! Narrative generation
//!
//! Turns an assessment into two short texts: a "today" explanation and a
//! "tomorrow" plan. Two strategies share the `Narrator` trait:
//!
//! - `TemplatedNarrator`: fixed sentences keyed by pattern label
//! - `DelegatedNarrator`: one call to a text backend per text, falling back
//!   to the templated output on any failure
//!
//! Neither ever returns an error or an empty string.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::ai::{TextBackend, TextClient};
use crate::error::{Error, Result};
use crate::models::{Entry, Pattern};
use crate::prompts::{Prompt, PromptId, PromptLibrary};

/// Used for the tomorrow framing when no focus tip fired
pub const NO_FOCUS_ENCOURAGEMENT: &str =
    "Nothing specific to change tomorrow. Keep following your current routine.";

/// Everything a narrator may mention about one submission
#[derive(Debug, Clone)]
pub struct NarrativeRequest {
    pub name: String,
    pub age: u32,
    pub latest: Entry,
    pub pattern: Pattern,
    pub previous_pattern: Option<Pattern>,
    pub confidence: u8,
    pub focus: Vec<String>,
}

impl NarrativeRequest {
    /// Previous pattern, only when it differs from the current one
    pub fn changed_from(&self) -> Option<Pattern> {
        self.previous_pattern.filter(|prev| *prev != self.pattern)
    }
}

/// Produces the two narrative texts for a submission
#[async_trait]
pub trait Narrator: Send + Sync {
    /// "Today" framing: what the recent pattern means
    async fn explain(&self, request: &NarrativeRequest) -> String;

    /// "Tomorrow" framing: what to focus on next
    async fn plan_tomorrow(&self, request: &NarrativeRequest) -> String;
}

/// Narration mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NarrativeMode {
    #[default]
    Templated,
    Delegated,
}

impl NarrativeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Templated => "templated",
            Self::Delegated => "delegated",
        }
    }
}

impl std::str::FromStr for NarrativeMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "templated" | "template" => Ok(Self::Templated),
            "delegated" | "llm" | "ai" => Ok(Self::Delegated),
            other => Err(Error::Config(format!(
                "Unknown narrative mode '{}' (expected templated or delegated)",
                other
            ))),
        }
    }
}

impl std::fmt::Display for NarrativeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Template-based narrator; deterministic and always succeeds
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplatedNarrator;

impl TemplatedNarrator {
    /// Today framing, built synchronously
    pub fn explanation(request: &NarrativeRequest) -> String {
        let mut msg = format!("{}, based on recent entries:\n\n", request.name);

        if let Some(prev) = request.changed_from() {
            msg.push_str(&format!(
                "Earlier pattern was '{}'. Now it is '{}'.\n\n",
                prev, request.pattern
            ));
        }

        msg.push_str(match request.pattern {
            Pattern::VeryHigh => {
                "Sugar levels are frequently high. Focus on sleep, regular meals, and activity."
            }
            Pattern::VeryLow => {
                "Sugar levels are running low. Monitor carefully and seek medical guidance."
            }
            Pattern::StableRoutine => {
                "Your routine looks stable. Keep maintaining sleep, activity, and consistency."
            }
            Pattern::InsufficientData | Pattern::Mixed => {
                "Your readings vary day to day. Improving routine consistency may help."
            }
        });

        msg.push_str(&format!("\n\n(Age considered: {})", request.age));
        msg
    }

    /// Tomorrow framing, built synchronously
    pub fn plan(request: &NarrativeRequest) -> String {
        if request.focus.is_empty() {
            return NO_FOCUS_ENCOURAGEMENT.to_string();
        }
        let mut msg = String::from("Tomorrow's focus:");
        for tip in &request.focus {
            msg.push_str("\n- ");
            msg.push_str(tip);
        }
        msg
    }
}

#[async_trait]
impl Narrator for TemplatedNarrator {
    async fn explain(&self, request: &NarrativeRequest) -> String {
        Self::explanation(request)
    }

    async fn plan_tomorrow(&self, request: &NarrativeRequest) -> String {
        Self::plan(request)
    }
}

/// Narrator that asks a text backend to phrase the texts
///
/// One backend call per text, no retries. Failures are logged and replaced
/// by the templated text for the same request.
#[derive(Clone)]
pub struct DelegatedNarrator {
    client: TextClient,
    explain_prompt: Prompt,
    plan_prompt: Prompt,
}

impl DelegatedNarrator {
    /// Load both prompts up front so a bad override fails at startup
    pub fn new(client: TextClient, prompts: &PromptLibrary) -> Result<Self> {
        Ok(Self {
            client,
            explain_prompt: prompts.load(PromptId::ExplainToday)?,
            plan_prompt: prompts.load(PromptId::PlanTomorrow)?,
        })
    }

    pub fn client(&self) -> &TextClient {
        &self.client
    }

    async fn delegate(&self, kind: PromptId, prompt: String, fallback: String) -> String {
        match self.client.generate(&prompt).await {
            Ok(text) if !text.trim().is_empty() => {
                debug!(prompt = kind.as_str(), model = %self.client.model(), "Narrative generated");
                text
            }
            Ok(_) => {
                warn!(
                    prompt = kind.as_str(),
                    host = %self.client.host(),
                    "Narrative backend returned blank text, using template"
                );
                fallback
            }
            Err(e) => {
                warn!(
                    prompt = kind.as_str(),
                    host = %self.client.host(),
                    error = %e,
                    "Narrative backend failed, using template"
                );
                fallback
            }
        }
    }
}

/// Template variables shared by both prompts
fn prompt_vars(request: &NarrativeRequest) -> HashMap<&'static str, String> {
    let entry = &request.latest;
    let mut vars = HashMap::new();
    vars.insert("name", request.name.clone());
    vars.insert("age", request.age.to_string());
    vars.insert("date", entry.date.clone());
    vars.insert("fasting", entry.fasting.to_string());
    vars.insert("post_meal", entry.post_meal.to_string());
    vars.insert("sleep", entry.sleep.to_string());
    vars.insert("activity", entry.activity.to_string());
    vars.insert("mood", entry.mood.to_string());
    vars.insert("medication", entry.medication.to_string());
    vars.insert("pattern", request.pattern.to_string());
    vars.insert(
        "previous_pattern",
        request
            .changed_from()
            .map(|p| p.to_string())
            .unwrap_or_default(),
    );
    vars.insert("confidence", request.confidence.to_string());
    vars.insert(
        "focus",
        request
            .focus
            .iter()
            .map(|tip| format!("- {}", tip))
            .collect::<Vec<_>>()
            .join("\n"),
    );
    vars
}

#[async_trait]
impl Narrator for DelegatedNarrator {
    async fn explain(&self, request: &NarrativeRequest) -> String {
        let prompt = self.explain_prompt.render(&prompt_vars(request));
        self.delegate(
            PromptId::ExplainToday,
            prompt,
            TemplatedNarrator::explanation(request),
        )
        .await
    }

    async fn plan_tomorrow(&self, request: &NarrativeRequest) -> String {
        let prompt = self.plan_prompt.render(&prompt_vars(request));
        self.delegate(
            PromptId::PlanTomorrow,
            prompt,
            TemplatedNarrator::plan(request),
        )
        .await
    }
}

/// Concrete narrator selected by configuration
#[derive(Clone)]
pub enum NarrativeStrategy {
    Templated(TemplatedNarrator),
    Delegated(DelegatedNarrator),
}

impl NarrativeStrategy {
    pub fn templated() -> Self {
        Self::Templated(TemplatedNarrator)
    }

    /// Delegated strategy using embedded prompts only
    pub fn delegated(client: TextClient) -> Result<Self> {
        DelegatedNarrator::new(client, &PromptLibrary::embedded_only()).map(Self::Delegated)
    }

    pub fn mode(&self) -> NarrativeMode {
        match self {
            Self::Templated(_) => NarrativeMode::Templated,
            Self::Delegated(_) => NarrativeMode::Delegated,
        }
    }

    /// Backend host when delegating (for status output)
    pub fn backend_host(&self) -> Option<&str> {
        match self {
            Self::Templated(_) => None,
            Self::Delegated(n) => Some(n.client().host()),
        }
    }

    /// Backend model when delegating (for status output)
    pub fn backend_model(&self) -> Option<&str> {
        match self {
            Self::Templated(_) => None,
            Self::Delegated(n) => Some(n.client().model()),
        }
    }
}

#[async_trait]
impl Narrator for NarrativeStrategy {
    async fn explain(&self, request: &NarrativeRequest) -> String {
        match self {
            Self::Templated(n) => n.explain(request).await,
            Self::Delegated(n) => n.explain(request).await,
        }
    }

    async fn plan_tomorrow(&self, request: &NarrativeRequest) -> String {
        match self {
            Self::Templated(n) => n.plan_tomorrow(request).await,
            Self::Delegated(n) => n.plan_tomorrow(request).await,
        }
    }
}

/// Narrative configuration
///
/// Environment variables:
/// - `NARRATIVE_MODE`: templated (default) or delegated
/// - backend variables as read by `TextClient::from_env`
#[derive(Clone, Default)]
pub struct NarrativeConfig {
    pub mode: NarrativeMode,
    pub client: Option<TextClient>,
    /// Prompt override directory (`None` = embedded prompts only)
    pub prompts_dir: Option<PathBuf>,
}

impl NarrativeConfig {
    /// Read configuration from the environment
    ///
    /// An unknown `NARRATIVE_MODE` is logged and treated as templated.
    pub fn from_env(data_dir: &Path) -> Self {
        let mode = match std::env::var("NARRATIVE_MODE") {
            Ok(value) => value.parse().unwrap_or_else(|e: Error| {
                warn!(error = %e, "Ignoring NARRATIVE_MODE");
                NarrativeMode::Templated
            }),
            Err(_) => NarrativeMode::Templated,
        };

        let client = match mode {
            NarrativeMode::Delegated => TextClient::from_env(),
            NarrativeMode::Templated => None,
        };

        Self {
            mode,
            client,
            prompts_dir: Some(data_dir.join("prompts")),
        }
    }

    /// Build the narrator this configuration describes
    ///
    /// Delegated mode without a backend, or with unreadable prompt
    /// overrides, logs a warning and stays templated.
    pub fn build(self) -> NarrativeStrategy {
        match (self.mode, self.client) {
            (NarrativeMode::Templated, _) => NarrativeStrategy::templated(),
            (NarrativeMode::Delegated, None) => {
                warn!("NARRATIVE_MODE=delegated but no text backend is configured, using templates");
                NarrativeStrategy::templated()
            }
            (NarrativeMode::Delegated, Some(client)) => {
                let prompts = match self.prompts_dir {
                    Some(dir) => PromptLibrary::with_override_dir(dir),
                    None => PromptLibrary::embedded_only(),
                };
                match DelegatedNarrator::new(client, &prompts) {
                    Ok(narrator) => NarrativeStrategy::Delegated(narrator),
                    Err(e) => {
                        warn!(error = %e, "Failed to load narrative prompts, using templates");
                        NarrativeStrategy::templated()
                    }
                }
            }
        }
    }
}

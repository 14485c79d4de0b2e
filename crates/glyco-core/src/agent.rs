//! Submission pipeline
//!
//! One submission runs load → append → rules → narrate → save and returns
//! an `Assessment`. The user profile is passed in by the shell on every
//! call; nothing about the current user lives in the agent itself.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::info;

use crate::error::Result;
use crate::export::{export_history, ExportFormat, HistoryExportOptions};
use crate::models::{Assessment, Entry, EntryForm, UserProfile, WeeklyTrend};
use crate::narrative::{NarrativeRequest, NarrativeStrategy, Narrator};
use crate::policy::Policy;
use crate::report::ReportExporter;
use crate::rules::RuleEngine;
use crate::store::HistoryStore;

/// Wires the store, rule engine, narrator and report exporter together
#[derive(Clone)]
pub struct Agent {
    store: HistoryStore,
    rules: RuleEngine,
    narrator: NarrativeStrategy,
    reports: ReportExporter,
}

impl Agent {
    pub fn new(
        store: HistoryStore,
        rules: RuleEngine,
        narrator: NarrativeStrategy,
        reports: ReportExporter,
    ) -> Self {
        Self {
            store,
            rules,
            narrator,
            reports,
        }
    }

    /// Agent with the standard layout under `data_dir`
    pub fn in_data_dir(data_dir: &Path, policy: Policy, narrator: NarrativeStrategy) -> Self {
        let reports = ReportExporter::in_data_dir(data_dir, policy.report_window);
        Self::new(
            HistoryStore::in_data_dir(data_dir),
            RuleEngine::new(policy),
            narrator,
            reports,
        )
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    pub fn rules(&self) -> &RuleEngine {
        &self.rules
    }

    pub fn narrator(&self) -> &NarrativeStrategy {
        &self.narrator
    }

    pub fn reports(&self) -> &ReportExporter {
        &self.reports
    }

    /// Record one daily entry and assess the updated history
    ///
    /// `today` fills in the date when the form leaves it blank. The history
    /// is saved after narration; a failed save is returned as an error and
    /// the assessment is discarded.
    pub async fn submit(
        &self,
        profile: &UserProfile,
        form: EntryForm,
        today: NaiveDate,
    ) -> Result<Assessment> {
        form.validate()?;
        let entry = form.into_entry(profile, today);

        let mut history = self.store.load(&profile.key);
        history.push(entry);

        let assessment = self.assess(profile, &history).await;
        self.store.save(&profile.key, &history)?;

        info!(
            user = %profile.key,
            pattern = %assessment.pattern,
            confidence = assessment.confidence,
            entries = assessment.entry_count,
            "Entry recorded"
        );
        Ok(assessment)
    }

    /// Assess a history whose last element is the latest entry
    ///
    /// Returns a neutral assessment for an empty history.
    pub async fn assess(&self, profile: &UserProfile, history: &[Entry]) -> Assessment {
        let pattern = self.rules.detect_pattern(history);
        let previous_pattern = self.rules.previous_pattern(history);
        let weekly = self.rules.weekly_trend(history);

        let Some(latest) = history.last() else {
            return Assessment {
                pattern,
                previous_pattern,
                pattern_changed: false,
                confidence: 0,
                focus: Vec::new(),
                weekly,
                explanation: String::new(),
                tomorrow: String::new(),
                entry_count: 0,
            };
        };

        let confidence = self.rules.confidence_score(latest);
        let focus = self.rules.daily_focus(latest);

        let request = NarrativeRequest {
            name: profile.name.clone(),
            age: profile.age,
            latest: latest.clone(),
            pattern,
            previous_pattern,
            confidence,
            focus: focus.clone(),
        };
        let explanation = self.narrator.explain(&request).await;
        let tomorrow = self.narrator.plan_tomorrow(&request).await;

        Assessment {
            pattern,
            previous_pattern,
            pattern_changed: request.changed_from().is_some(),
            confidence,
            focus,
            weekly,
            explanation,
            tomorrow,
            entry_count: history.len(),
        }
    }

    /// Full history for a user, oldest first
    pub fn history(&self, profile: &UserProfile) -> Vec<Entry> {
        self.store.load(&profile.key)
    }

    pub fn trend(&self, profile: &UserProfile) -> Option<WeeklyTrend> {
        self.rules.weekly_trend(&self.history(profile))
    }

    /// Write the PDF report for a user; returns its path
    pub fn report(&self, profile: &UserProfile) -> Result<PathBuf> {
        self.reports.export(profile, &self.history(profile))
    }

    /// Export a user's history as CSV or JSON text
    pub fn export(
        &self,
        profile: &UserProfile,
        format: ExportFormat,
        opts: &HistoryExportOptions,
    ) -> Result<String> {
        let text = export_history(&self.history(profile), format, opts)?;
        info!(user = %profile.key, format = format.as_str(), "History exported");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{MockBackend, TextClient};
    use crate::models::{Activity, Medication, Mood, Pattern};
    use crate::rules::{TIP_PRAISE, TIP_SLEEP};
    use tempfile::TempDir;

    fn form(fasting: u32, sleep: f64) -> EntryForm {
        EntryForm {
            date: None,
            fasting,
            post_meal: 160,
            sleep,
            activity: Activity::High,
            mood: Mood::Good,
            medication: Medication::Yes,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn agent(dir: &Path) -> Agent {
        Agent::in_data_dir(dir, Policy::default(), NarrativeStrategy::templated())
    }

    #[tokio::test]
    async fn test_first_submission() {
        let dir = TempDir::new().unwrap();
        let agent = agent(dir.path());
        let profile = UserProfile::new("Dana", 52).unwrap();

        let assessment = agent.submit(&profile, form(110, 7.0), today()).await.unwrap();
        assert_eq!(assessment.pattern, Pattern::InsufficientData);
        assert_eq!(assessment.previous_pattern, None);
        assert!(!assessment.pattern_changed);
        assert_eq!(assessment.confidence, 100);
        assert_eq!(assessment.focus, vec![TIP_PRAISE.to_string()]);
        assert_eq!(assessment.weekly, None);
        assert_eq!(assessment.entry_count, 1);
        assert!(assessment.explanation.starts_with("dana, based on recent entries:"));

        let history = agent.history(&profile);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].date, "2026-10-19");
        assert_eq!(history[0].name.as_deref(), Some("dana"));
    }

    #[tokio::test]
    async fn test_pattern_change_is_narrated() {
        let dir = TempDir::new().unwrap();
        let agent = agent(dir.path());
        let profile = UserProfile::new("dana", 52).unwrap();

        for _ in 0..3 {
            agent.submit(&profile, form(110, 7.5), today()).await.unwrap();
        }
        let assessment = agent.submit(&profile, form(300, 5.0), today()).await.unwrap();

        // Means of 110,110,300 = 173.3 fasting; sleep mean 6.67 → mixed
        assert_eq!(assessment.previous_pattern, Some(Pattern::StableRoutine));
        assert_eq!(assessment.pattern, Pattern::Mixed);
        assert!(assessment.pattern_changed);
        assert!(assessment
            .explanation
            .contains("Earlier pattern was 'stable routine'. Now it is 'mixed pattern'."));
        assert!(assessment.focus.contains(&TIP_SLEEP.to_string()));
        assert!(assessment.tomorrow.contains(TIP_SLEEP));
    }

    #[tokio::test]
    async fn test_invalid_form_is_rejected_and_not_saved() {
        let dir = TempDir::new().unwrap();
        let agent = agent(dir.path());
        let profile = UserProfile::new("dana", 52).unwrap();

        assert!(agent.submit(&profile, form(20, 7.0), today()).await.is_err());
        assert!(agent.history(&profile).is_empty());
    }

    #[tokio::test]
    async fn test_failing_backend_still_saves_and_explains() {
        let dir = TempDir::new().unwrap();
        let mock = MockBackend::failing();
        let narrator = NarrativeStrategy::delegated(TextClient::Mock(mock.clone())).unwrap();
        let agent = Agent::in_data_dir(dir.path(), Policy::default(), narrator);
        let profile = UserProfile::new("sam", 61).unwrap();

        let assessment = agent.submit(&profile, form(190, 5.0), today()).await.unwrap();
        assert!(!assessment.explanation.is_empty());
        assert!(!assessment.tomorrow.is_empty());
        assert_eq!(mock.call_count(), 2);
        assert_eq!(agent.history(&profile).len(), 1);
    }

    #[tokio::test]
    async fn test_trend_report_and_export() {
        let dir = TempDir::new().unwrap();
        let agent = agent(dir.path());
        let profile = UserProfile::new("dana", 52).unwrap();

        for i in 0..7 {
            agent.submit(&profile, form(100 + i, 7.0), today()).await.unwrap();
        }

        let trend = agent.trend(&profile).unwrap();
        assert_eq!(trend.avg_fasting, 103.0);
        assert_eq!(trend.avg_post_meal, 160.0);
        assert_eq!(trend.avg_sleep, 7.0);

        let path = agent.report(&profile).unwrap();
        assert_eq!(path, agent.reports().path_for(&profile.key));
        assert!(path.ends_with(format!("reports/{}_report.pdf", profile.key)));
        assert!(path.exists());

        let csv = agent
            .export(&profile, ExportFormat::Csv, &HistoryExportOptions::default())
            .unwrap();
        assert_eq!(csv.lines().count(), 8);
    }

    #[tokio::test]
    async fn test_assess_empty_history() {
        let dir = TempDir::new().unwrap();
        let agent = agent(dir.path());
        let profile = UserProfile::new("dana", 52).unwrap();

        let assessment = agent.assess(&profile, &[]).await;
        assert_eq!(assessment.pattern, Pattern::InsufficientData);
        assert_eq!(assessment.entry_count, 0);
    }
}

//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use glyco_core::models::{Activity, Medication, Mood};
use glyco_core::test_utils::MockOllamaServer;
use glyco_core::{EntryForm, ExportFormat, NarrativeStrategy, Pattern, TextClient};
use tempfile::TempDir;

use crate::commands::{self, truncate};

fn setup_data_dir() -> TempDir {
    TempDir::new().unwrap()
}

fn form(date: &str, fasting: u32, sleep: f64) -> EntryForm {
    EntryForm {
        date: Some(date.to_string()),
        fasting,
        post_meal: 150,
        sleep,
        activity: Activity::Medium,
        mood: Mood::Good,
        medication: Medication::Yes,
    }
}

// ========== Core Utility Tests ==========

#[test]
fn test_open_agent_uses_data_dir() {
    let dir = setup_data_dir();
    let agent = commands::open_agent(dir.path(), None).unwrap();
    assert!(agent.store().dir().starts_with(dir.path()));
    assert!(agent.reports().out_dir().starts_with(dir.path()));
    assert_eq!(agent.rules().policy().pattern_window, 3);
}

#[test]
fn test_open_agent_with_explicit_policy() {
    let dir = setup_data_dir();
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, "[windows]\npattern = 5\n").unwrap();

    let agent = commands::open_agent(dir.path(), Some(&path)).unwrap();
    assert_eq!(agent.rules().policy().pattern_window, 5);
    assert_eq!(agent.rules().policy().trend_window, 7);
}

#[test]
fn test_open_agent_rejects_malformed_policy() {
    let dir = setup_data_dir();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[windows\npattern = ").unwrap();

    assert!(commands::open_agent(dir.path(), Some(&path)).is_err());
}

#[test]
fn test_login_normalizes_name() {
    let profile = commands::login("  Dana ", 52).unwrap();
    assert_eq!(profile.name, "dana");
    assert_eq!(profile.key, commands::login("DANA", 30).unwrap().key);
    assert!(profile.key.starts_with("dana-"));

    assert!(commands::login("   ", 52).is_err());
    assert!(commands::login("dana", 5).is_err());
}

#[test]
fn test_export_options_parsing() {
    let opts = commands::export_options(Some("2026-10-01"), None, Some(3)).unwrap();
    assert_eq!(opts.from.unwrap().to_string(), "2026-10-01");
    assert!(opts.to.is_none());
    assert_eq!(opts.last, Some(3));

    assert!(commands::export_options(Some("10/01/2026"), None, None).is_err());
    assert!(commands::export_options(None, Some("yesterday"), None).is_err());
}

#[test]
fn test_truncate() {
    assert_eq!(truncate("2026-10-01", 12), "2026-10-01");
    assert_eq!(truncate("a very long free-text date", 12), "a very lo...");
}

// ========== Entry Command Tests ==========

#[tokio::test]
async fn test_cmd_log_appends_entry() {
    let dir = setup_data_dir();
    let agent = commands::open_agent(dir.path(), None).unwrap();
    let profile = commands::login("dana", 52).unwrap();

    commands::cmd_log(&agent, &profile, form("2026-10-01", 110, 7.5))
        .await
        .unwrap();
    commands::cmd_log(&agent, &profile, form("2026-10-02", 115, 7.0))
        .await
        .unwrap();

    let history = agent.history(&profile);
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].date, "2026-10-01");
    assert_eq!(history[1].fasting, 115);
    assert_eq!(history[1].name.as_deref(), Some("dana"));
    assert_eq!(history[1].age, Some(52));
}

#[tokio::test]
async fn test_cmd_log_rejects_out_of_range() {
    let dir = setup_data_dir();
    let agent = commands::open_agent(dir.path(), None).unwrap();
    let profile = commands::login("dana", 52).unwrap();

    let result = commands::cmd_log(&agent, &profile, form("2026-10-01", 400, 7.5)).await;
    assert!(result.is_err());
    assert!(agent.history(&profile).is_empty());
}

#[tokio::test]
async fn test_cmd_history_and_trend() {
    let dir = setup_data_dir();
    let agent = commands::open_agent(dir.path(), None).unwrap();
    let profile = commands::login("dana", 52).unwrap();

    // Empty history prints a message, not an error
    assert!(commands::cmd_history(&agent, &profile, None).is_ok());
    assert!(commands::cmd_trend(&agent, &profile).is_ok());

    for day in 1..=7 {
        commands::cmd_log(&agent, &profile, form(&format!("2026-10-0{}", day), 110, 7.5))
            .await
            .unwrap();
    }

    assert!(commands::cmd_history(&agent, &profile, Some(3)).is_ok());
    assert!(commands::cmd_trend(&agent, &profile).is_ok());

    let trend = agent.trend(&profile).unwrap();
    assert_eq!(trend.avg_fasting, 110.0);
    assert_eq!(trend.avg_sleep, 7.5);
}

#[tokio::test]
async fn test_trend_hint_follows_policy_window() {
    let dir = setup_data_dir();
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, "[windows]\ntrend = 5\n").unwrap();
    let agent = commands::open_agent(dir.path(), Some(&path)).unwrap();
    let window = agent.rules().policy().trend_window;
    assert_eq!(window, 5);

    let hint = commands::trend_hint(window, 2);
    assert_eq!(hint, "Weekly trend available after 5 entries (2 so far)");
    assert!(!hint.contains('7'));

    let profile = commands::login("dana", 52).unwrap();
    for day in 1..=4 {
        commands::cmd_log(&agent, &profile, form(&format!("2026-10-0{}", day), 110, 7.5))
            .await
            .unwrap();
    }
    assert!(agent.trend(&profile).is_none());

    commands::cmd_log(&agent, &profile, form("2026-10-05", 110, 7.5))
        .await
        .unwrap();
    assert!(agent.trend(&profile).is_some());
}

// ========== Report / Export Command Tests ==========

#[tokio::test]
async fn test_cmd_report_writes_pdf() {
    let dir = setup_data_dir();
    let agent = commands::open_agent(dir.path(), None).unwrap();
    let profile = commands::login("dana", 52).unwrap();
    commands::cmd_log(&agent, &profile, form("2026-10-01", 110, 7.5))
        .await
        .unwrap();

    commands::cmd_report(&agent, &profile).unwrap();

    let path = agent.reports().path_for(&profile.key);
    assert!(path.starts_with(dir.path().join("reports")));
    let bytes = std::fs::read(path).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_cmd_export_to_file() {
    let dir = setup_data_dir();
    let agent = commands::open_agent(dir.path(), None).unwrap();
    let profile = commands::login("dana", 52).unwrap();
    for day in 1..=3 {
        commands::cmd_log(&agent, &profile, form(&format!("2026-10-0{}", day), 110, 7.5))
            .await
            .unwrap();
    }

    let out = dir.path().join(ExportFormat::Json.file_name(&profile.key));
    let opts = commands::export_options(None, None, Some(2)).unwrap();
    commands::cmd_export(&agent, &profile, "json", &opts, Some(&out)).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["date"], "2026-10-02");

    let out = dir.path().join("dana.csv");
    let opts = commands::export_options(None, None, None).unwrap();
    commands::cmd_export(&agent, &profile, "csv", &opts, Some(&out)).unwrap();
    let csv = std::fs::read_to_string(&out).unwrap();
    assert_eq!(csv.lines().count(), 4);
}

#[test]
fn test_cmd_export_unknown_format() {
    let dir = setup_data_dir();
    let agent = commands::open_agent(dir.path(), None).unwrap();
    let profile = commands::login("dana", 52).unwrap();
    let opts = commands::export_options(None, None, None).unwrap();

    let result = commands::cmd_export(&agent, &profile, "xml", &opts, None);
    assert!(result.is_err());
}

// ========== Status Command Tests ==========

#[test]
fn test_cmd_policy_show() {
    let dir = setup_data_dir();
    assert!(commands::cmd_policy_show(dir.path(), None).is_ok());

    let missing = dir.path().join("missing.toml");
    assert!(commands::cmd_policy_show(dir.path(), Some(&missing)).is_ok());
}

#[test]
fn test_sample_request_is_consistent() {
    let request = commands::sample_request();
    assert_eq!(request.pattern, Pattern::Mixed);
    assert_eq!(request.changed_from(), Some(Pattern::StableRoutine));
    assert_eq!(request.focus.len(), 2);
}

#[tokio::test]
async fn test_cmd_narrator_test_templated() {
    let narrator = NarrativeStrategy::templated();
    assert!(commands::cmd_narrator_test(&narrator).await.is_ok());
}

#[tokio::test]
async fn test_cmd_narrator_test_with_backend() {
    let server = MockOllamaServer::start().await;
    let client = TextClient::ollama(&server.url(), "test-model");
    let narrator = NarrativeStrategy::delegated(client).unwrap();

    assert!(commands::cmd_narrator_test(&narrator).await.is_ok());
    // One call per framing
    assert_eq!(server.request_count(), 2);
}

// ========== Prompts Command Tests ==========

#[test]
fn test_cmd_prompts() {
    let dir = setup_data_dir();
    assert!(commands::cmd_prompts_list(dir.path()).is_ok());
    assert!(commands::cmd_prompts_show(dir.path(), "explain_today").is_ok());
    assert!(commands::cmd_prompts_show(dir.path(), "unknown").is_ok());
    assert!(commands::cmd_prompts_path(dir.path()).is_ok());
}

#[test]
fn test_cmd_prompts_show_override() {
    let dir = setup_data_dir();
    let prompts_dir = dir.path().join("prompts");
    std::fs::create_dir_all(&prompts_dir).unwrap();
    std::fs::write(
        prompts_dir.join("plan_tomorrow.md"),
        "---\nid: plan_tomorrow\nversion: 2\n---\nKeep it short for {{name}}.",
    )
    .unwrap();

    assert!(commands::cmd_prompts_list(dir.path()).is_ok());
    assert!(commands::cmd_prompts_show(dir.path(), "plan_tomorrow").is_ok());
}

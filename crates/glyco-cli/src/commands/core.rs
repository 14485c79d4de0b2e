//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_agent` - Build the pipeline for a data directory
//! - `login` - Resolve a name and age to a user profile
//! - `narrator_from_env` - Narrative strategy from environment variables

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use glyco_core::{
    Agent, HistoryExportOptions, NarrativeConfig, NarrativeStrategy, Policy, UserProfile,
};

/// Load the policy and narrator, and wire up the agent
pub fn open_agent(data_dir: &Path, policy_path: Option<&Path>) -> Result<Agent> {
    let policy = Policy::load(policy_path, data_dir).context("Failed to load policy")?;
    let narrator = narrator_from_env(data_dir);
    Ok(Agent::in_data_dir(data_dir, policy, narrator))
}

/// Narrative strategy as configured by NARRATIVE_MODE and backend variables
pub fn narrator_from_env(data_dir: &Path) -> NarrativeStrategy {
    NarrativeConfig::from_env(data_dir).build()
}

/// The CLI has no session: every command names its user
pub fn login(name: &str, age: u32) -> Result<UserProfile> {
    Ok(UserProfile::new(name, age)?)
}

/// Parse export filters given on the command line
pub fn export_options(
    from: Option<&str>,
    to: Option<&str>,
    last: Option<usize>,
) -> Result<HistoryExportOptions> {
    let from = from
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("Invalid --from date format (use YYYY-MM-DD)")?;
    let to = to
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("Invalid --to date format (use YYYY-MM-DD)")?;
    Ok(HistoryExportOptions { from, to, last })
}

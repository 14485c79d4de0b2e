//! Report and export command implementations

use std::path::Path;

use anyhow::{Context, Result};
use glyco_core::{Agent, ExportFormat, HistoryExportOptions, UserProfile};

pub fn cmd_report(agent: &Agent, profile: &UserProfile) -> Result<()> {
    let path = agent.report(profile).context("Failed to write report")?;
    println!("📄 Report written to {}", path.display());
    Ok(())
}

/// Export history to a file, or to stdout when no output path is given
pub fn cmd_export(
    agent: &Agent,
    profile: &UserProfile,
    format: &str,
    opts: &HistoryExportOptions,
    output: Option<&Path>,
) -> Result<()> {
    let format: ExportFormat = format.parse()?;
    let text = agent.export(profile, format, opts)?;

    match output {
        Some(path) => {
            std::fs::write(path, &text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("✅ Exported {} history to {}", format.as_str(), path.display());
        }
        None => print!("{}", text),
    }

    Ok(())
}

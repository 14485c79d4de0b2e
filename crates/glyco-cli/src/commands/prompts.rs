//! Prompts-related command implementations

use std::path::Path;

use anyhow::Result;
use glyco_core::{PromptId, PromptLibrary};

/// List all available prompts and their override status
pub fn cmd_prompts_list(data_dir: &Path) -> Result<()> {
    let mut library = PromptLibrary::new(data_dir);

    println!("Available Prompts:\n");

    println!("{:<20} {:>7}  {}", "ID", "VERSION", "OVERRIDE");
    println!("{}", "-".repeat(40));

    for id in PromptId::all() {
        let has_override = library.has_override(*id);
        let prompt = library.get(*id)?;
        let override_status = if has_override { "✓ Custom" } else { "Default" };
        println!(
            "{:<20} {:>7}  {}",
            id.as_str(),
            prompt.metadata.version,
            override_status
        );
    }

    println!();
    if let Some(dir) = library.override_dir() {
        println!("Override directory: {}", dir.display());
    }

    println!();
    println!("To customize a prompt:");
    println!("  1. Copy the default to the override directory");
    println!("  2. Edit the file with your changes");
    println!("  3. Set NARRATIVE_MODE=delegated and restart");

    Ok(())
}

/// Show the content of a specific prompt
pub fn cmd_prompts_show(data_dir: &Path, prompt_id: &str) -> Result<()> {
    let Some(id) = PromptId::all()
        .iter()
        .copied()
        .find(|id| id.as_str() == prompt_id)
    else {
        eprintln!("Unknown prompt ID: {}", prompt_id);
        eprintln!();
        eprintln!("Available prompts:");
        for id in PromptId::all() {
            eprintln!("  - {}", id.as_str());
        }
        return Ok(());
    };

    let library = PromptLibrary::new(data_dir);
    let prompt = library.load(id)?;

    println!("Prompt: {}", prompt.metadata.id);
    println!("Version: {}", prompt.metadata.version);
    println!(
        "Source: {}",
        if prompt.is_override {
            "Override"
        } else {
            "Default"
        }
    );

    if let Some(ref path) = prompt.override_path {
        println!("Override Path: {}", path.display());
    }

    println!();
    println!("--- Content ---");
    println!("{}", prompt.content);

    Ok(())
}

/// Show the path where prompt overrides should be placed
pub fn cmd_prompts_path(data_dir: &Path) -> Result<()> {
    let library = PromptLibrary::new(data_dir);
    if let Some(path) = library.override_dir() {
        println!("{}", path.display());

        if !path.exists() {
            eprintln!();
            eprintln!("Note: This directory does not exist yet.");
            eprintln!("Create it to start adding custom prompts.");
        }
    }

    Ok(())
}

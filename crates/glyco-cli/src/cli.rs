//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use glyco_core::models::{Activity, Medication, Mood, DEFAULT_AGE, SLEEP_RANGE};

/// Glyco - Daily glucose support log
#[derive(Parser)]
#[command(name = "glyco")]
#[command(about = "Daily glucose log with pattern, confidence and focus tips", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Data directory (histories, reports, prompt and policy overrides)
    ///
    /// Defaults to GLYCO_DATA_DIR, then the platform data dir.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Policy file (thresholds, penalties, windows)
    #[arg(long, global = true)]
    pub policy: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Who the command is for
#[derive(clap::Args, Debug, Clone)]
pub struct UserArgs {
    /// Your name (case-insensitive)
    #[arg(short, long)]
    pub name: String,

    /// Your age
    #[arg(short, long, default_value_t = DEFAULT_AGE, value_parser = clap::value_parser!(u32).range(10..=100))]
    pub age: u32,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log today's readings and show the assessment
    Log {
        #[command(flatten)]
        user: UserArgs,

        /// Entry date (defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Fasting sugar in mg/dL (60-300)
        #[arg(long, value_parser = clap::value_parser!(u32).range(60..=300))]
        fasting: u32,

        /// Post-meal sugar in mg/dL (80-350)
        #[arg(long, value_parser = clap::value_parser!(u32).range(80..=350))]
        post_meal: u32,

        /// Hours slept (0-10)
        #[arg(long, value_parser = parse_sleep)]
        sleep: f64,

        /// Physical activity: low, medium, high
        #[arg(long)]
        activity: Activity,

        /// Mood: good, okay, low
        #[arg(long)]
        mood: Mood,

        /// Medication taken today: yes, no
        #[arg(long)]
        medication: Medication,
    },

    /// List logged entries
    History {
        #[command(flatten)]
        user: UserArgs,

        /// Only show the most recent N entries
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show the weekly trend
    Trend {
        #[command(flatten)]
        user: UserArgs,
    },

    /// Write the PDF report
    Report {
        #[command(flatten)]
        user: UserArgs,
    },

    /// Export history as CSV or JSON
    Export {
        #[command(flatten)]
        user: UserArgs,

        /// Output format: csv, json
        #[arg(short, long, default_value = "csv")]
        format: String,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Only the most recent N entries
        #[arg(long)]
        last: Option<usize>,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the active rule policy
    Policy,

    /// Narrative backend commands
    Narrator {
        #[command(subcommand)]
        action: NarratorAction,
    },

    /// Manage narrative prompts
    Prompts {
        #[command(subcommand)]
        action: Option<PromptsAction>,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Directory containing static files to serve
        #[arg(long)]
        static_dir: Option<PathBuf>,

        /// Allowed CORS origin (repeatable)
        #[arg(long = "allow-origin")]
        allowed_origins: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum NarratorAction {
    /// Run a sample entry through the configured narrator
    Test,
}

#[derive(Subcommand)]
pub enum PromptsAction {
    /// List all prompts and their override status
    List,
    /// Show the content of a specific prompt
    Show {
        /// Prompt ID (e.g., explain_today)
        prompt_id: String,
    },
    /// Show the prompt override directory
    Path,
}

fn parse_sleep(s: &str) -> Result<f64, String> {
    let hours: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a number of hours", s))?;
    if SLEEP_RANGE.contains(&hours) {
        Ok(hours)
    } else {
        Err(format!(
            "sleep must be between {} and {} hours",
            SLEEP_RANGE.start(),
            SLEEP_RANGE.end()
        ))
    }
}

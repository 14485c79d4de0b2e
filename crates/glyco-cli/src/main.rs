//! Glyco CLI - Daily glucose support log
//!
//! Usage:
//!   glyco log --name dana --fasting 110 --post-meal 150 --sleep 7 \
//!       --activity medium --mood good --medication yes
//!   glyco history --name dana        List entries
//!   glyco report --name dana         Write the PDF report
//!   glyco serve --port 3000          Start web server

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use glyco_core::default_data_dir;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    let policy_path = cli.policy.as_deref();

    match cli.command {
        Commands::Log {
            user,
            date,
            fasting,
            post_meal,
            sleep,
            activity,
            mood,
            medication,
        } => {
            let agent = commands::open_agent(&data_dir, policy_path)?;
            let profile = commands::login(&user.name, user.age)?;
            let form = glyco_core::EntryForm {
                date,
                fasting,
                post_meal,
                sleep,
                activity,
                mood,
                medication,
            };
            commands::cmd_log(&agent, &profile, form).await
        }
        Commands::History { user, limit } => {
            let agent = commands::open_agent(&data_dir, policy_path)?;
            let profile = commands::login(&user.name, user.age)?;
            commands::cmd_history(&agent, &profile, limit)
        }
        Commands::Trend { user } => {
            let agent = commands::open_agent(&data_dir, policy_path)?;
            let profile = commands::login(&user.name, user.age)?;
            commands::cmd_trend(&agent, &profile)
        }
        Commands::Report { user } => {
            let agent = commands::open_agent(&data_dir, policy_path)?;
            let profile = commands::login(&user.name, user.age)?;
            commands::cmd_report(&agent, &profile)
        }
        Commands::Export {
            user,
            format,
            from,
            to,
            last,
            output,
        } => {
            let agent = commands::open_agent(&data_dir, policy_path)?;
            let profile = commands::login(&user.name, user.age)?;
            let opts = commands::export_options(from.as_deref(), to.as_deref(), last)?;
            commands::cmd_export(&agent, &profile, &format, &opts, output.as_deref())
        }
        Commands::Policy => commands::cmd_policy_show(&data_dir, policy_path),
        Commands::Narrator { action } => match action {
            NarratorAction::Test => {
                let narrator = commands::narrator_from_env(&data_dir);
                commands::cmd_narrator_test(&narrator).await
            }
        },
        Commands::Prompts { action } => match action {
            None | Some(PromptsAction::List) => commands::cmd_prompts_list(&data_dir),
            Some(PromptsAction::Show { prompt_id }) => {
                commands::cmd_prompts_show(&data_dir, &prompt_id)
            }
            Some(PromptsAction::Path) => commands::cmd_prompts_path(&data_dir),
        },
        Commands::Serve {
            port,
            host,
            static_dir,
            allowed_origins,
        } => {
            commands::cmd_serve(
                &data_dir,
                policy_path,
                &host,
                port,
                static_dir.as_deref(),
                allowed_origins,
            )
            .await
        }
    }
}

//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (open_agent, login, export options)
//! - `entries` - Log an entry, list history, weekly trend
//! - `prompts` - Prompt library management commands
//! - `reports` - PDF report and history export
//! - `serve` - Web server command
//! - `status` - Policy and narrator status commands

pub mod core;
pub mod entries;
pub mod prompts;
pub mod reports;
pub mod serve;
pub mod status;

// Re-export command functions for main.rs
pub use core::*;
pub use entries::*;
pub use prompts::*;
pub use reports::*;
pub use serve::*;
pub use status::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

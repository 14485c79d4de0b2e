//! Server command implementation

use std::path::Path;

use anyhow::{Context, Result};
use glyco_core::Policy;

use super::narrator_from_env;

pub async fn cmd_serve(
    data_dir: &Path,
    policy_path: Option<&Path>,
    host: &str,
    port: u16,
    static_dir: Option<&Path>,
    allowed_origins: Vec<String>,
) -> Result<()> {
    let policy = Policy::load(policy_path, data_dir).context("Failed to load policy")?;
    let narrator = narrator_from_env(data_dir);

    println!("🚀 Starting Glyco web server...");
    println!("   Data directory: {}", data_dir.display());
    println!("   Listening: http://{}:{}", host, port);
    println!("   Narrative: {}", narrator.mode());
    if let Some(dir) = static_dir {
        println!("   Static files: {}", dir.display());
    }
    if !allowed_origins.is_empty() {
        println!("   🌐 CORS origins: {}", allowed_origins.join(", "));
    }
    println!();
    println!("   ⚠️  No authentication - do not expose to an untrusted network!");
    println!("   Press Ctrl+C to stop");

    let config = glyco_server::ServerConfig {
        allowed_origins,
        data_dir: data_dir.to_path_buf(),
        policy,
        narrator,
        static_dir: static_dir.map(Path::to_path_buf),
        ..Default::default()
    };

    glyco_server::serve_with_config(host, port, config).await?;

    Ok(())
}

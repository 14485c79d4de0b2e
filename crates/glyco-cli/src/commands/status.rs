//! Status-related command implementations (policy, narrator test)

use std::path::Path;

use anyhow::{Context, Result};
use glyco_core::models::{Activity, Medication, Mood};
use glyco_core::policy::policy_override_path;
use glyco_core::{Entry, NarrativeRequest, NarrativeStrategy, Narrator, Pattern, Policy, TextBackend};

/// Print the active policy and where it came from
pub fn cmd_policy_show(data_dir: &Path, policy_path: Option<&Path>) -> Result<()> {
    let policy = Policy::load(policy_path, data_dir).context("Failed to load policy")?;

    let override_path = policy_override_path(data_dir);
    let source = match policy_path {
        Some(path) if path.exists() => path.display().to_string(),
        _ if override_path.exists() => override_path.display().to_string(),
        _ => "embedded defaults".to_string(),
    };

    println!();
    println!("⚙️  Glyco Policy");
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Source: {}", source);
    println!();
    println!("{}", serde_json::to_string_pretty(&policy)?);
    println!();
    Ok(())
}

/// Sample request used to exercise a narrator
pub fn sample_request() -> NarrativeRequest {
    NarrativeRequest {
        name: "sample".to_string(),
        age: 40,
        latest: Entry {
            name: Some("sample".to_string()),
            age: Some(40),
            date: "2026-01-07".to_string(),
            fasting: 135,
            post_meal: 190,
            sleep: 5.5,
            activity: Activity::Low,
            mood: Mood::Okay,
            medication: Medication::Yes,
        },
        pattern: Pattern::Mixed,
        previous_pattern: Some(Pattern::StableRoutine),
        confidence: 70,
        focus: vec![
            glyco_core::rules::TIP_SLEEP.to_string(),
            glyco_core::rules::TIP_ACTIVITY.to_string(),
        ],
    }
}

/// Run the sample request through the narrator and print both texts
pub async fn cmd_narrator_test(narrator: &NarrativeStrategy) -> Result<()> {
    println!("🧪 Narrator mode: {}", narrator.mode());

    if let NarrativeStrategy::Delegated(n) = narrator {
        let client = n.client();
        println!("   Backend: {} (model: {})", client.host(), client.model());
        if client.health_check().await {
            println!("   ✅ Backend is responding");
        } else {
            println!("   ❌ Backend not responding (fallback text will be used)");
        }
    }

    let request = sample_request();
    println!();
    println!("💬 Today");
    println!("{}", narrator.explain(&request).await);
    println!();
    println!("🗓️  Tomorrow");
    println!("{}", narrator.plan_tomorrow(&request).await);
    println!();

    Ok(())
}

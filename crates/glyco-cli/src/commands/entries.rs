//! Entry command implementations (log, history, trend)

use anyhow::Result;
use chrono::Local;
use glyco_core::{Agent, Assessment, EntryForm, UserProfile, WeeklyTrend};

use super::truncate;

/// Log one entry and print the assessment
pub async fn cmd_log(agent: &Agent, profile: &UserProfile, form: EntryForm) -> Result<()> {
    let today = Local::now().date_naive();
    let assessment = agent.submit(profile, form, today).await?;
    print_assessment(&assessment, agent.rules().policy().trend_window);
    Ok(())
}

/// Line shown in place of the weekly trend while the window is not yet full
pub fn trend_hint(window: usize, entry_count: usize) -> String {
    format!(
        "Weekly trend available after {} entries ({} so far)",
        window, entry_count
    )
}

fn print_assessment(assessment: &Assessment, trend_window: usize) {
    println!();
    println!("🩸 Pattern: {}", assessment.pattern.title());
    if let (true, Some(prev)) = (assessment.pattern_changed, assessment.previous_pattern) {
        println!("   (was: {})", prev.title());
    }
    println!("📈 Confidence: {}/100", assessment.confidence);
    println!();

    println!("💬 Today");
    for line in assessment.explanation.lines() {
        println!("   {}", line);
    }
    println!();

    println!("🗓️  Tomorrow");
    for line in assessment.tomorrow.lines() {
        println!("   {}", line);
    }
    println!();

    match &assessment.weekly {
        Some(trend) => print_trend(trend),
        None => println!("   {}", trend_hint(trend_window, assessment.entry_count)),
    }
    println!();
}

pub fn cmd_history(agent: &Agent, profile: &UserProfile, limit: Option<usize>) -> Result<()> {
    let history = agent.history(profile);

    if history.is_empty() {
        println!("No entries recorded yet for {}.", profile.name);
        return Ok(());
    }

    let start = limit.map_or(0, |n| history.len().saturating_sub(n));
    let shown = &history[start..];

    println!(
        "📋 {} entries for {} (showing {}):\n",
        history.len(),
        profile.name,
        shown.len()
    );
    println!(
        "{:<12} {:>8} {:>10} {:>6}  {:<8} {:<6} {:<4}",
        "DATE", "FASTING", "POST-MEAL", "SLEEP", "ACTIVITY", "MOOD", "MEDS"
    );
    println!("{}", "-".repeat(62));

    for entry in shown {
        println!(
            "{:<12} {:>8} {:>10} {:>6.1}  {:<8} {:<6} {:<4}",
            truncate(&entry.date, 12),
            entry.fasting,
            entry.post_meal,
            entry.sleep,
            entry.activity.as_str(),
            entry.mood.as_str(),
            entry.medication.as_str()
        );
    }

    Ok(())
}

pub fn cmd_trend(agent: &Agent, profile: &UserProfile) -> Result<()> {
    match agent.trend(profile) {
        Some(trend) => print_trend(&trend),
        None => {
            let window = agent.rules().policy().trend_window;
            println!(
                "Not enough entries for a weekly trend (need {}, have {}).",
                window,
                agent.history(profile).len()
            );
        }
    }
    Ok(())
}

fn print_trend(trend: &WeeklyTrend) {
    println!("📊 Weekly trend");
    println!("   Avg fasting:   {:.1} mg/dL", trend.avg_fasting);
    println!("   Avg post-meal: {:.1} mg/dL", trend.avg_post_meal);
    println!("   Avg sleep:     {:.1} h", trend.avg_sleep);
}

//! Rule engine
//!
//! Pattern classification, confidence scoring, focus tips and the weekly
//! trend. Everything here is a pure function of the history (or the latest
//! entry) and the policy table. Short histories produce sentinel values
//! rather than errors.

use crate::models::{Activity, Entry, Medication, Pattern, WeeklyTrend};
use crate::policy::Policy;

pub const TIP_SLEEP: &str = "Try to sleep earlier tonight and aim for at least 7 hours.";
pub const TIP_ACTIVITY: &str = "Add a 10-15 minute walk after meals.";
pub const TIP_MEDICATION: &str = "Set a reminder to take medication consistently.";
pub const TIP_SUGAR: &str = "Sugar levels are concerning today. Please consult a doctor.";
pub const TIP_PRAISE: &str = "Great job maintaining good sleep and activity!";

/// Means over a window of entries
#[derive(Debug, Clone, Copy, PartialEq)]
struct WindowMeans {
    fasting: f64,
    post_meal: f64,
    sleep: f64,
}

impl WindowMeans {
    /// Means over `entries`; caller guarantees the slice is non-empty
    fn of(entries: &[Entry]) -> Self {
        let n = entries.len() as f64;
        let fasting = entries.iter().map(|e| e.fasting as f64).sum::<f64>() / n;
        let post_meal = entries.iter().map(|e| e.post_meal as f64).sum::<f64>() / n;
        let sleep = entries.iter().map(|e| e.sleep).sum::<f64>() / n;
        Self {
            fasting,
            post_meal,
            sleep,
        }
    }
}

fn last_n(history: &[Entry], n: usize) -> &[Entry] {
    &history[history.len().saturating_sub(n)..]
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Rule engine parameterised by a policy table
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    policy: Policy,
}

impl RuleEngine {
    pub fn new(policy: Policy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Classify the last `pattern_window` entries
    pub fn detect_pattern(&self, history: &[Entry]) -> Pattern {
        let window = self.policy.pattern_window;
        if window == 0 || history.len() < window {
            return Pattern::InsufficientData;
        }

        let means = WindowMeans::of(last_n(history, window));
        let p = &self.policy;

        if means.fasting > p.very_high_fasting || means.post_meal > p.very_high_post_meal {
            Pattern::VeryHigh
        } else if means.fasting < p.very_low_fasting {
            Pattern::VeryLow
        } else if means.fasting < p.stable_fasting && means.sleep >= p.stable_sleep {
            Pattern::StableRoutine
        } else {
            Pattern::Mixed
        }
    }

    /// Pattern as it was before the latest entry
    ///
    /// Needs one more entry than the pattern window, so that the previous
    /// label is a real classification and not the insufficient-data sentinel.
    pub fn previous_pattern(&self, history: &[Entry]) -> Option<Pattern> {
        if history.len() < self.policy.pattern_window + 1 {
            return None;
        }
        Some(self.detect_pattern(&history[..history.len() - 1]))
    }

    fn fasting_out_of_band(&self, entry: &Entry) -> bool {
        entry.fasting < self.policy.target_fasting_low
            || entry.fasting > self.policy.target_fasting_high
    }

    fn short_sleep(&self, entry: &Entry) -> bool {
        entry.sleep < self.policy.short_sleep
    }

    /// Daily stability confidence in [0, 100]
    pub fn confidence_score(&self, entry: &Entry) -> u8 {
        let p = &self.policy;
        let mut penalty: u32 = 0;

        if self.fasting_out_of_band(entry) {
            penalty += p.fasting_penalty as u32;
        }
        if self.short_sleep(entry) {
            penalty += p.short_sleep_penalty as u32;
        }
        if entry.activity == Activity::Low {
            penalty += p.low_activity_penalty as u32;
        }
        if entry.medication == Medication::No {
            penalty += p.missed_medication_penalty as u32;
        }

        100u32.saturating_sub(penalty) as u8
    }

    /// Advisory strings for the conditions triggered by the latest entry
    ///
    /// Order is display order only.
    pub fn daily_focus(&self, entry: &Entry) -> Vec<String> {
        let mut tips = Vec::new();

        if self.short_sleep(entry) {
            tips.push(TIP_SLEEP.to_string());
        }
        if entry.activity == Activity::Low {
            tips.push(TIP_ACTIVITY.to_string());
        }
        if entry.medication == Medication::No {
            tips.push(TIP_MEDICATION.to_string());
        }
        if self.fasting_out_of_band(entry) {
            tips.push(TIP_SUGAR.to_string());
        }
        if entry.sleep >= self.policy.stable_sleep && entry.activity != Activity::Low {
            tips.push(TIP_PRAISE.to_string());
        }

        tips
    }

    /// One-decimal means over exactly the last `trend_window` entries
    pub fn weekly_trend(&self, history: &[Entry]) -> Option<WeeklyTrend> {
        let window = self.policy.trend_window;
        if window == 0 || history.len() < window {
            return None;
        }

        let means = WindowMeans::of(last_n(history, window));
        Some(WeeklyTrend {
            avg_fasting: round1(means.fasting),
            avg_post_meal: round1(means.post_meal),
            avg_sleep: round1(means.sleep),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Mood;

    fn entry(fasting: u32, post_meal: u32, sleep: f64) -> Entry {
        Entry {
            name: Some("dana".into()),
            age: Some(40),
            date: "2026-10-01".into(),
            fasting,
            post_meal,
            sleep,
            activity: Activity::Medium,
            mood: Mood::Good,
            medication: Medication::Yes,
        }
    }

    fn daily(fasting: u32, sleep: f64, activity: Activity, medication: Medication) -> Entry {
        Entry {
            activity,
            medication,
            ..entry(fasting, 150, sleep)
        }
    }

    #[test]
    fn test_short_history_is_insufficient() {
        let engine = RuleEngine::default();
        assert_eq!(engine.detect_pattern(&[]), Pattern::InsufficientData);
        let two = vec![entry(100, 150, 8.0), entry(100, 150, 8.0)];
        assert_eq!(engine.detect_pattern(&two), Pattern::InsufficientData);
    }

    #[test]
    fn test_very_high_by_fasting_mean() {
        let engine = RuleEngine::default();
        let history = vec![
            entry(190, 200, 7.0),
            entry(185, 200, 7.0),
            entry(195, 200, 7.0),
        ];
        assert_eq!(engine.detect_pattern(&history), Pattern::VeryHigh);
    }

    #[test]
    fn test_very_high_by_post_meal_mean() {
        let engine = RuleEngine::default();
        let history = vec![
            entry(100, 260, 8.0),
            entry(100, 260, 8.0),
            entry(100, 240, 8.0),
        ];
        assert_eq!(engine.detect_pattern(&history), Pattern::VeryHigh);
    }

    #[test]
    fn test_very_low() {
        let engine = RuleEngine::default();
        let history = vec![entry(65, 120, 8.0), entry(62, 120, 8.0), entry(68, 120, 8.0)];
        assert_eq!(engine.detect_pattern(&history), Pattern::VeryLow);
    }

    #[test]
    fn test_stable_routine() {
        let engine = RuleEngine::default();
        let history = vec![entry(100, 150, 7.0), entry(110, 150, 8.0), entry(105, 150, 7.0)];
        assert_eq!(engine.detect_pattern(&history), Pattern::StableRoutine);
    }

    #[test]
    fn test_short_sleep_is_mixed_not_stable() {
        let engine = RuleEngine::default();
        let history = vec![entry(100, 150, 5.0), entry(110, 150, 5.5), entry(105, 150, 4.0)];
        assert_eq!(engine.detect_pattern(&history), Pattern::Mixed);
    }

    #[test]
    fn test_boundaries_are_strict() {
        let engine = RuleEngine::default();
        // Mean fasting exactly 180 is not "very high"; exactly 70 is not "very low"
        let at_high = vec![entry(180, 150, 8.0); 3];
        assert_eq!(engine.detect_pattern(&at_high), Pattern::Mixed);
        let at_low = vec![entry(70, 150, 8.0); 3];
        assert_eq!(engine.detect_pattern(&at_low), Pattern::StableRoutine);
    }

    #[test]
    fn test_only_last_window_matters() {
        let engine = RuleEngine::default();
        let mut history = vec![entry(250, 300, 3.0); 10];
        history.extend(vec![entry(100, 150, 8.0); 3]);
        assert_eq!(engine.detect_pattern(&history), Pattern::StableRoutine);

        let mut other = vec![entry(65, 90, 9.0); 2];
        other.extend(vec![entry(100, 150, 8.0); 3]);
        assert_eq!(
            engine.detect_pattern(&history),
            engine.detect_pattern(&other)
        );
    }

    #[test]
    fn test_thresholds_come_from_policy() {
        let policy = Policy {
            very_high_fasting: 140.0,
            very_high_post_meal: 200.0,
            ..Policy::default()
        };
        let engine = RuleEngine::new(policy);
        let history = vec![entry(150, 180, 8.0); 3];
        assert_eq!(engine.detect_pattern(&history), Pattern::VeryHigh);
        assert_eq!(
            RuleEngine::default().detect_pattern(&history),
            Pattern::Mixed
        );
    }

    #[test]
    fn test_previous_pattern_requires_four_entries() {
        let engine = RuleEngine::default();
        let three = vec![entry(100, 150, 8.0); 3];
        assert_eq!(engine.previous_pattern(&three), None);

        let mut four = vec![entry(190, 260, 5.0); 3];
        four.push(entry(100, 150, 8.0));
        assert_eq!(engine.previous_pattern(&four), Some(Pattern::VeryHigh));
    }

    #[test]
    fn test_confidence_perfect_day() {
        let engine = RuleEngine::default();
        let e = daily(110, 7.0, Activity::High, Medication::Yes);
        assert_eq!(engine.confidence_score(&e), 100);
    }

    #[test]
    fn test_confidence_all_penalties() {
        let engine = RuleEngine::default();
        let e = daily(200, 5.0, Activity::Low, Medication::No);
        assert_eq!(engine.confidence_score(&e), 20);
    }

    #[test]
    fn test_confidence_floors_at_zero() {
        let policy = Policy {
            fasting_penalty: 90,
            missed_medication_penalty: 90,
            ..Policy::default()
        };
        let engine = RuleEngine::new(policy);
        let e = daily(50, 8.0, Activity::High, Medication::No);
        assert_eq!(engine.confidence_score(&e), 0);
    }

    #[test]
    fn test_confidence_band_edges() {
        let engine = RuleEngine::default();
        let at_low = daily(70, 8.0, Activity::Medium, Medication::Yes);
        let at_high = daily(160, 8.0, Activity::Medium, Medication::Yes);
        let above = daily(161, 8.0, Activity::Medium, Medication::Yes);
        assert_eq!(engine.confidence_score(&at_low), 100);
        assert_eq!(engine.confidence_score(&at_high), 100);
        assert_eq!(engine.confidence_score(&above), 70);
    }

    #[test]
    fn test_daily_focus_order_and_content() {
        let engine = RuleEngine::default();
        let e = daily(200, 5.0, Activity::Low, Medication::No);
        let tips = engine.daily_focus(&e);
        assert_eq!(
            tips,
            vec![TIP_SLEEP, TIP_ACTIVITY, TIP_MEDICATION, TIP_SUGAR]
        );
    }

    #[test]
    fn test_daily_focus_praise() {
        let engine = RuleEngine::default();
        let e = daily(110, 8.0, Activity::High, Medication::Yes);
        assert_eq!(engine.daily_focus(&e), vec![TIP_PRAISE]);

        // Middling sleep: no tips at all
        let e = daily(110, 6.5, Activity::Medium, Medication::Yes);
        assert!(engine.daily_focus(&e).is_empty());
    }

    #[test]
    fn test_weekly_trend_needs_seven() {
        let engine = RuleEngine::default();
        let six = vec![entry(100, 150, 8.0); 6];
        assert_eq!(engine.weekly_trend(&six), None);
    }

    #[test]
    fn test_weekly_trend_uses_last_seven() {
        let engine = RuleEngine::default();
        let mut history = vec![entry(300, 350, 0.0)];
        for (f, p, s) in [
            (100, 150, 7.0),
            (110, 160, 6.0),
            (120, 170, 8.0),
            (130, 180, 7.5),
            (105, 155, 6.5),
            (115, 165, 7.0),
            (101, 140, 5.0),
        ] {
            history.push(entry(f, p, s));
        }

        let trend = engine.weekly_trend(&history).unwrap();
        // 781 / 7 = 111.571..., 1120 / 7 = 160.0, 47 / 7 = 6.714...
        assert_eq!(trend.avg_fasting, 111.6);
        assert_eq!(trend.avg_post_meal, 160.0);
        assert_eq!(trend.avg_sleep, 6.7);
    }
}

//! Data models for Glyco

use std::ops::RangeInclusive;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Accepted fasting glucose range on the entry form (mg/dL)
pub const FASTING_RANGE: RangeInclusive<u32> = 60..=300;

/// Accepted post-meal glucose range on the entry form (mg/dL)
pub const POST_MEAL_RANGE: RangeInclusive<u32> = 80..=350;

/// Accepted sleep range on the entry form (hours)
pub const SLEEP_RANGE: RangeInclusive<f64> = 0.0..=10.0;

/// Accepted age range on the login form
pub const AGE_RANGE: RangeInclusive<u32> = 10..=100;

/// Default age used when the user does not supply one
pub const DEFAULT_AGE: u32 = 40;

/// Self-reported physical activity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    Low,
    Medium,
    High,
}

impl Activity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::str::FromStr for Activity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("Unknown activity level: {}", s)),
        }
    }
}

impl std::fmt::Display for Activity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Self-reported mood
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Good,
    Okay,
    Low,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Okay => "okay",
            Self::Low => "low",
        }
    }
}

impl std::str::FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "good" => Ok(Self::Good),
            "okay" | "ok" => Ok(Self::Okay),
            "low" => Ok(Self::Low),
            _ => Err(format!("Unknown mood: {}", s)),
        }
    }
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether medication was taken today
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Medication {
    Yes,
    No,
}

impl Medication {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
        }
    }
}

impl std::str::FromStr for Medication {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yes" | "y" | "true" => Ok(Self::Yes),
            "no" | "n" | "false" => Ok(Self::No),
            _ => Err(format!("Unknown medication answer: {}", s)),
        }
    }
}

impl std::fmt::Display for Medication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One daily log entry as persisted in a user's history file
///
/// There is no identifier beyond the position in the history list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Display name of the user (older files use the key `user`)
    #[serde(default, alias = "user", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    /// Free-text date, normally YYYY-MM-DD
    pub date: String,
    /// Fasting glucose (mg/dL)
    pub fasting: u32,
    /// Post-meal glucose (mg/dL)
    pub post_meal: u32,
    /// Hours slept
    pub sleep: f64,
    pub activity: Activity,
    pub mood: Mood,
    pub medication: Medication,
}

/// Entry form as submitted by the UI shell (server body or CLI arguments)
#[derive(Debug, Clone, Deserialize)]
pub struct EntryForm {
    /// Defaults to today's date when omitted or blank
    #[serde(default)]
    pub date: Option<String>,
    pub fasting: u32,
    pub post_meal: u32,
    pub sleep: f64,
    pub activity: Activity,
    pub mood: Mood,
    pub medication: Medication,
}

impl EntryForm {
    /// Check the form against the widget ranges of the entry form
    pub fn validate(&self) -> Result<()> {
        if !FASTING_RANGE.contains(&self.fasting) {
            return Err(Error::InvalidData(format!(
                "Fasting sugar must be between {} and {}",
                FASTING_RANGE.start(),
                FASTING_RANGE.end()
            )));
        }
        if !POST_MEAL_RANGE.contains(&self.post_meal) {
            return Err(Error::InvalidData(format!(
                "Post-meal sugar must be between {} and {}",
                POST_MEAL_RANGE.start(),
                POST_MEAL_RANGE.end()
            )));
        }
        if !SLEEP_RANGE.contains(&self.sleep) {
            return Err(Error::InvalidData(format!(
                "Sleep hours must be between {} and {}",
                SLEEP_RANGE.start(),
                SLEEP_RANGE.end()
            )));
        }
        Ok(())
    }

    /// Build the persisted entry for a user, filling in the date if missing
    pub fn into_entry(self, profile: &UserProfile, today: NaiveDate) -> Entry {
        let date = self
            .date
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| today.format("%Y-%m-%d").to_string());

        Entry {
            name: Some(profile.name.clone()),
            age: Some(profile.age),
            date,
            fasting: self.fasting,
            post_meal: self.post_meal,
            sleep: self.sleep,
            activity: self.activity,
            mood: self.mood,
            medication: self.medication,
        }
    }
}

/// The logged-in user, carried explicitly through the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Name as used for login (trimmed, lower-cased)
    pub name: String,
    pub age: u32,
    /// Filesystem-safe key derived from the name
    pub key: String,
}

impl UserProfile {
    /// Log in by name. The name is the only credential.
    pub fn new(name: &str, age: u32) -> Result<Self> {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return Err(Error::InvalidData("Please enter your name.".into()));
        }
        if !AGE_RANGE.contains(&age) {
            return Err(Error::InvalidData(format!(
                "Age must be between {} and {}",
                AGE_RANGE.start(),
                AGE_RANGE.end()
            )));
        }
        let key = crate::store::storage_key(&name)?;
        Ok(Self { name, age, key })
    }
}

/// Coarse label summarising the recent glucose/sleep trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pattern {
    #[serde(rename = "insufficient data")]
    InsufficientData,
    #[serde(rename = "very high readings")]
    VeryHigh,
    #[serde(rename = "very low readings")]
    VeryLow,
    #[serde(rename = "stable routine")]
    StableRoutine,
    #[serde(rename = "mixed pattern")]
    Mixed,
}

impl Pattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InsufficientData => "insufficient data",
            Self::VeryHigh => "very high readings",
            Self::VeryLow => "very low readings",
            Self::StableRoutine => "stable routine",
            Self::Mixed => "mixed pattern",
        }
    }

    /// Label in title case for headings ("Very High Readings")
    pub fn title(&self) -> String {
        self.as_str()
            .split(' ')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn all() -> &'static [Pattern] {
        &[
            Self::InsufficientData,
            Self::VeryHigh,
            Self::VeryLow,
            Self::StableRoutine,
            Self::Mixed,
        ]
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Pattern {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Pattern::all()
            .iter()
            .find(|p| p.as_str() == s.trim().to_lowercase())
            .copied()
            .ok_or_else(|| format!("Unknown pattern: {}", s))
    }
}

/// Rounded means over the trend window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeeklyTrend {
    pub avg_fasting: f64,
    pub avg_post_meal: f64,
    pub avg_sleep: f64,
}

/// Everything the shell shows after one submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    pub pattern: Pattern,
    pub previous_pattern: Option<Pattern>,
    pub pattern_changed: bool,
    /// Daily stability confidence (0-100)
    pub confidence: u8,
    /// Tomorrow's focus tips
    pub focus: Vec<String>,
    pub weekly: Option<WeeklyTrend>,
    /// "Today" framing of the narrative
    pub explanation: String,
    /// "Tomorrow" framing of the narrative
    pub tomorrow: String,
    /// History length after this submission
    pub entry_count: usize,
}

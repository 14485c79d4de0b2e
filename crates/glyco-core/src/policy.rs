//! Rule policy table
//!
//! Thresholds, penalties and window sizes used by the rule engine. Values
//! differ between deployments, so none of them are hard-coded in the rules.
//!
//! ## Configuration Resolution
//!
//! 1. Explicit path (`--policy`), if it exists
//! 2. Override in the data dir (`<data dir>/config/policy.toml`)
//! 3. Embedded defaults (compiled into binary)

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Embedded default policy (compiled into binary)
const DEFAULT_POLICY: &str = include_str!("../../../config/policy.toml");

/// Complete policy table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Policy {
    /// Entries used for pattern detection
    pub pattern_window: usize,
    /// Entries used for the weekly trend
    pub trend_window: usize,
    /// Entries listed in the PDF report
    pub report_window: usize,

    /// Mean fasting above this is "very high"
    pub very_high_fasting: f64,
    /// Mean post-meal above this is "very high"
    pub very_high_post_meal: f64,
    /// Mean fasting below this is "very low"
    pub very_low_fasting: f64,
    /// Mean fasting below this (with enough sleep) is "stable"
    pub stable_fasting: f64,
    /// Minimum mean sleep for "stable"; also the good-sleep bar for focus tips
    pub stable_sleep: f64,

    /// Lower bound of the daily target fasting band
    pub target_fasting_low: u32,
    /// Upper bound of the daily target fasting band
    pub target_fasting_high: u32,
    /// Sleep below this counts as short
    pub short_sleep: f64,

    pub fasting_penalty: u8,
    pub short_sleep_penalty: u8,
    pub low_activity_penalty: u8,
    pub missed_medication_penalty: u8,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            pattern_window: 3,
            trend_window: 7,
            report_window: 7,
            very_high_fasting: 180.0,
            very_high_post_meal: 250.0,
            very_low_fasting: 70.0,
            stable_fasting: 120.0,
            stable_sleep: 7.0,
            target_fasting_low: 70,
            target_fasting_high: 160,
            short_sleep: 6.0,
            fasting_penalty: 30,
            short_sleep_penalty: 15,
            low_activity_penalty: 15,
            missed_medication_penalty: 20,
        }
    }
}

impl Policy {
    /// Load the policy using the standard resolution order
    ///
    /// Explicit path, then `<data_dir>/config/policy.toml`, then the
    /// embedded default.
    pub fn load(explicit: Option<&Path>, data_dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            if path.exists() {
                return Self::from_file(path);
            }
            tracing::warn!(path = %path.display(), "Policy file not found, using defaults");
        } else {
            let path = policy_override_path(data_dir);
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Self::from_toml(DEFAULT_POLICY)
    }

    /// Load a policy file, applying it over the built-in defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read policy: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parse policy TOML; keys that are absent keep their defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: RawPolicy = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid policy TOML: {}", e)))?;

        let mut policy = Policy::default();

        if let Some(w) = raw.windows {
            if let Some(v) = w.pattern {
                policy.pattern_window = v;
            }
            if let Some(v) = w.trend {
                policy.trend_window = v;
            }
            if let Some(v) = w.report {
                policy.report_window = v;
            }
        }

        if let Some(p) = raw.pattern {
            if let Some(v) = p.very_high_fasting {
                policy.very_high_fasting = v;
            }
            if let Some(v) = p.very_high_post_meal {
                policy.very_high_post_meal = v;
            }
            if let Some(v) = p.very_low_fasting {
                policy.very_low_fasting = v;
            }
            if let Some(v) = p.stable_fasting {
                policy.stable_fasting = v;
            }
            if let Some(v) = p.stable_sleep {
                policy.stable_sleep = v;
            }
        }

        if let Some(c) = raw.confidence {
            if let Some(v) = c.target_fasting_low {
                policy.target_fasting_low = v;
            }
            if let Some(v) = c.target_fasting_high {
                policy.target_fasting_high = v;
            }
            if let Some(v) = c.short_sleep {
                policy.short_sleep = v;
            }
        }

        if let Some(p) = raw.penalties {
            if let Some(v) = p.fasting_out_of_range {
                policy.fasting_penalty = v;
            }
            if let Some(v) = p.short_sleep {
                policy.short_sleep_penalty = v;
            }
            if let Some(v) = p.low_activity {
                policy.low_activity_penalty = v;
            }
            if let Some(v) = p.missed_medication {
                policy.missed_medication_penalty = v;
            }
        }

        policy.validate()?;
        Ok(policy)
    }

    fn validate(&self) -> Result<()> {
        if self.pattern_window == 0 || self.trend_window == 0 || self.report_window == 0 {
            return Err(Error::Config("Window sizes must be at least 1".into()));
        }
        if self.target_fasting_low > self.target_fasting_high {
            return Err(Error::Config(format!(
                "Target fasting band is empty ({} > {})",
                self.target_fasting_low, self.target_fasting_high
            )));
        }
        Ok(())
    }
}

/// Policy override path inside a data directory
pub fn policy_override_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config").join("policy.toml")
}

/// Raw policy structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawPolicy {
    windows: Option<RawWindows>,
    pattern: Option<RawPattern>,
    confidence: Option<RawConfidence>,
    penalties: Option<RawPenalties>,
}

#[derive(Debug, Deserialize)]
struct RawWindows {
    pattern: Option<usize>,
    trend: Option<usize>,
    report: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawPattern {
    very_high_fasting: Option<f64>,
    very_high_post_meal: Option<f64>,
    very_low_fasting: Option<f64>,
    stable_fasting: Option<f64>,
    stable_sleep: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawConfidence {
    target_fasting_low: Option<u32>,
    target_fasting_high: Option<u32>,
    short_sleep: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawPenalties {
    fasting_out_of_range: Option<u8>,
    short_sleep: Option<u8>,
    low_activity: Option<u8>,
    missed_medication: Option<u8>,
}

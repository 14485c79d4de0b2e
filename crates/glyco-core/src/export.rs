//! History export
//!
//! Supports CSV and pretty JSON, optionally filtered by date range or
//! limited to the most recent entries.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::Entry;

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Json => "application/json",
        }
    }

    /// File name for a user's export
    pub fn file_name(&self, key: &str) -> String {
        format!("{}_history.{}", key, self.as_str())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(Error::InvalidData(format!(
                "Unknown export format '{}' (expected csv or json)",
                other
            ))),
        }
    }
}

/// Options for history export
#[derive(Debug, Clone, Default)]
pub struct HistoryExportOptions {
    /// Start date filter (inclusive)
    pub from: Option<NaiveDate>,
    /// End date filter (inclusive)
    pub to: Option<NaiveDate>,
    /// Keep only the most recent N entries (applied after date filters)
    pub last: Option<usize>,
}

impl HistoryExportOptions {
    /// Apply the filters, keeping chronological order
    ///
    /// Entries whose date does not parse as YYYY-MM-DD are dropped when a
    /// date filter is set.
    pub fn select<'a>(&self, history: &'a [Entry]) -> Vec<&'a Entry> {
        let dated = self.from.is_some() || self.to.is_some();
        let mut selected: Vec<&Entry> = history
            .iter()
            .filter(|e| {
                if !dated {
                    return true;
                }
                let Ok(date) = NaiveDate::parse_from_str(e.date.trim(), "%Y-%m-%d") else {
                    return false;
                };
                self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
            })
            .collect();

        if let Some(last) = self.last {
            let start = selected.len().saturating_sub(last);
            selected.drain(..start);
        }
        selected
    }
}

/// Flat CSV row
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    date: &'a str,
    fasting: u32,
    post_meal: u32,
    sleep: f64,
    activity: &'static str,
    mood: &'static str,
    medication: &'static str,
}

/// Export entries as CSV with a header row
pub fn history_to_csv(entries: &[&Entry]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if entries.is_empty() {
        writer.write_record([
            "date",
            "fasting",
            "post_meal",
            "sleep",
            "activity",
            "mood",
            "medication",
        ])?;
    }
    for entry in entries {
        writer.serialize(CsvRow {
            date: &entry.date,
            fasting: entry.fasting,
            post_meal: entry.post_meal,
            sleep: entry.sleep,
            activity: entry.activity.as_str(),
            mood: entry.mood.as_str(),
            medication: entry.medication.as_str(),
        })?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::InvalidData(format!("CSV flush failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| Error::InvalidData(format!("CSV not UTF-8: {}", e)))
}

/// Export entries as a pretty JSON array (same shape as the history file)
pub fn history_to_json(entries: &[&Entry]) -> Result<String> {
    Ok(serde_json::to_string_pretty(entries)?)
}

/// Filter and export in one step
pub fn export_history(
    history: &[Entry],
    format: ExportFormat,
    opts: &HistoryExportOptions,
) -> Result<String> {
    let selected = opts.select(history);
    match format {
        ExportFormat::Csv => history_to_csv(&selected),
        ExportFormat::Json => history_to_json(&selected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Activity, Medication, Mood};

    fn entry(date: &str, fasting: u32) -> Entry {
        Entry {
            name: Some("dana".into()),
            age: Some(52),
            date: date.into(),
            fasting,
            post_meal: 160,
            sleep: 6.5,
            activity: Activity::Low,
            mood: Mood::Good,
            medication: Medication::No,
        }
    }

    #[test]
    fn test_csv_export() {
        let history = vec![entry("2026-10-01", 110), entry("2026-10-02", 125)];
        let csv = export_history(&history, ExportFormat::Csv, &Default::default()).unwrap();

        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "date,fasting,post_meal,sleep,activity,mood,medication");
        assert_eq!(lines[1], "2026-10-01,110,160,6.5,low,good,no");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_csv_empty_has_header() {
        let csv = history_to_csv(&[]).unwrap();
        assert_eq!(csv.trim(), "date,fasting,post_meal,sleep,activity,mood,medication");
    }

    #[test]
    fn test_json_export_matches_history_shape() {
        let history = vec![entry("2026-10-01", 110)];
        let json = export_history(&history, ExportFormat::Json, &Default::default()).unwrap();
        let parsed: Vec<Entry> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, history);
    }

    #[test]
    fn test_date_filters_and_last() {
        let history = vec![
            entry("2026-10-01", 101),
            entry("2026-10-02", 102),
            entry("yesterday", 103),
            entry("2026-10-04", 104),
        ];

        let opts = HistoryExportOptions {
            from: NaiveDate::from_ymd_opt(2026, 10, 2),
            ..Default::default()
        };
        let picked: Vec<u32> = opts.select(&history).iter().map(|e| e.fasting).collect();
        assert_eq!(picked, vec![102, 104]);

        let opts = HistoryExportOptions {
            last: Some(2),
            ..Default::default()
        };
        let picked: Vec<u32> = opts.select(&history).iter().map(|e| e.fasting).collect();
        assert_eq!(picked, vec![103, 104]);
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!("xml".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::Json.file_name("dana"), "dana_history.json");
    }
}

//! PDF report of recent entries
//!
//! One A4 document per user, written to `<out_dir>/<key>_report.pdf` and
//! overwritten on every export. Text is set in the standard Helvetica
//! Type 1 font, so only ASCII survives; `clean_text` folds the common
//! typographic characters to ASCII first.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::Result;
use crate::models::{Entry, UserProfile};

/// Closing line on every report
pub const DISCLAIMER: &str = "This tool does not provide medical advice. \
     Consult a healthcare professional for clinical decisions.";

/// Shown instead of entry lines when the history is empty
pub const NO_ENTRIES: &str = "No entries recorded yet.";

// A4 in points
const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 50.0;

const TITLE_SIZE: f32 = 14.0;
const BODY_SIZE: f32 = 11.0;
const NOTE_SIZE: f32 = 9.0;
const LINE_HEIGHT: f32 = 16.0;
const TITLE_GAP: f32 = 12.0;

/// Fold text to the ASCII subset the base fonts can show
///
/// Smart quotes, dashes, ellipsis and non-breaking spaces are
/// transliterated; any other non-ASCII character is dropped.
pub fn clean_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => out.push('"'),
            '\u{2010}'..='\u{2015}' | '\u{2212}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            '\u{00A0}' | '\u{2007}' | '\u{202F}' | '\t' => out.push(' '),
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            _ => {}
        }
    }
    out
}

/// Report title for a profile
pub fn report_title(profile: &UserProfile) -> String {
    format!(
        "Diabetic Support Report - {} (Age {})",
        profile.name, profile.age
    )
}

/// One report line for an entry
pub fn entry_line(entry: &Entry) -> String {
    format!(
        "{} | Fasting: {} | Post: {} | Sleep: {}h",
        entry.date, entry.fasting, entry.post_meal, entry.sleep
    )
}

/// Writes per-user PDF reports
#[derive(Debug, Clone)]
pub struct ReportExporter {
    out_dir: PathBuf,
    window: usize,
}

impl ReportExporter {
    /// Exporter writing to `out_dir`, covering the last `window` entries
    pub fn new(out_dir: impl Into<PathBuf>, window: usize) -> Self {
        Self {
            out_dir: out_dir.into(),
            window: window.max(1),
        }
    }

    /// Exporter writing to `<data_dir>/reports`
    pub fn in_data_dir(data_dir: &Path, window: usize) -> Self {
        Self::new(data_dir.join("reports"), window)
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Deterministic report path for a user
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.out_dir.join(format!("{}_report.pdf", key))
    }

    /// Lines printed under the title, oldest first
    pub fn body_lines(&self, history: &[Entry]) -> Vec<String> {
        if history.is_empty() {
            return vec![NO_ENTRIES.to_string()];
        }
        let start = history.len().saturating_sub(self.window);
        history[start..].iter().map(entry_line).collect()
    }

    /// Render the report and write it, replacing any earlier report
    pub fn export(&self, profile: &UserProfile, history: &[Entry]) -> Result<PathBuf> {
        let bytes = self.render(profile, history)?;

        fs::create_dir_all(&self.out_dir)?;
        let path = self.path_for(&profile.key);

        let tmp = NamedTempFile::new_in(&self.out_dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            writer.write_all(&bytes)?;
            writer.flush()?;
        }
        tmp.persist(&path).map_err(|e| e.error)?;

        info!(
            path = %path.display(),
            entries = history.len().min(self.window),
            "Report exported"
        );
        Ok(path)
    }

    /// Render the report to PDF bytes
    pub fn render(&self, profile: &UserProfile, history: &[Entry]) -> Result<Vec<u8>> {
        let title = clean_text(&report_title(profile));
        let lines: Vec<String> = self
            .body_lines(history)
            .iter()
            .map(|l| clean_text(l))
            .collect();

        let mut layout = PageLayout::new();
        layout.text(&title, TITLE_SIZE, LINE_HEIGHT + TITLE_GAP);
        for line in &lines {
            layout.text(line, BODY_SIZE, LINE_HEIGHT);
        }
        layout.gap(LINE_HEIGHT);
        layout.text(&clean_text(DISCLAIMER), NOTE_SIZE, LINE_HEIGHT);

        let mut doc = build_document(layout.finish())?;
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        Ok(bytes)
    }
}

/// Places text lines top to bottom, starting a new page at the bottom margin
struct PageLayout {
    pages: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    cursor: f32,
}

impl PageLayout {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: Vec::new(),
            cursor: PAGE_HEIGHT - MARGIN,
        }
    }

    fn text(&mut self, text: &str, size: f32, advance: f32) {
        if self.cursor - size < MARGIN {
            self.break_page();
        }
        let baseline = self.cursor - size;
        self.current.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), size.into()]),
            Operation::new("Td", vec![MARGIN.into(), baseline.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ]);
        self.cursor -= advance;
    }

    fn gap(&mut self, height: f32) {
        self.cursor -= height;
    }

    fn break_page(&mut self) {
        let page = std::mem::take(&mut self.current);
        self.pages.push(page);
        self.cursor = PAGE_HEIGHT - MARGIN;
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        if !self.current.is_empty() || self.pages.is_empty() {
            let page = std::mem::take(&mut self.current);
            self.pages.push(page);
        }
        self.pages
    }
}

fn build_document(pages: Vec<Vec<Operation>>) -> Result<Document> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    Ok(doc)
}

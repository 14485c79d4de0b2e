//! Per-user history store
//!
//! Each user's history is one pretty-printed JSON array at
//! `<dir>/<key>.json`, loaded and saved as a whole. Histories are
//! append-only: there is no update or delete.
//!
//! Reads never fail: a missing file is an empty history, and an unreadable
//! or malformed file is logged and also treated as empty. Saves go through
//! a temp file in the same directory that is renamed over the target.
//! Concurrent submissions for the same user are not serialised; the last
//! write wins.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use regex::Regex;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::Entry;

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "GLYCO_DATA_DIR";

/// Default data directory: `GLYCO_DATA_DIR`, then the platform data dir
pub fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::data_local_dir()
        .map(|d| d.join("glyco"))
        .unwrap_or_else(|| PathBuf::from("glyco-data"))
}

/// Bytes of the name digest kept in the key
const KEY_DIGEST_BYTES: usize = 8;

/// Derive a filesystem-safe storage key from a free-text user name
///
/// The key is a readable slug of the trimmed, lower-cased name followed by
/// a short SHA-256 of that same name, so names that only differ in case or
/// surrounding whitespace share a key and every other pair of names does
/// not. Names with no ASCII letters or digits get the digest alone.
pub fn storage_key(name: &str) -> Result<String> {
    let normalized = name.trim().to_lowercase();
    let unsafe_chars = Regex::new(r"[^a-z0-9]+")?;
    let slug = unsafe_chars.replace_all(&normalized, "_");
    let slug = slug.trim_matches('_');

    let digest = Sha256::digest(normalized.as_bytes());
    let suffix = hex::encode(&digest[..KEY_DIGEST_BYTES]);

    if slug.is_empty() {
        Ok(suffix)
    } else {
        Ok(format!("{}-{}", slug, suffix))
    }
}

/// JSON-file history store, one file per user
#[derive(Debug, Clone)]
pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    /// Create a store rooted at `dir` (created lazily on first save)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under `<data_dir>/history`
    pub fn in_data_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("history"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the history file for a storage key
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Load a user's full history; any failure yields an empty history
    pub fn load(&self, key: &str) -> Vec<Entry> {
        let path = self.path_for(key);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No history yet");
                return Vec::new();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read history, treating as empty");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Entry>>(&content) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Malformed history file, treating as empty");
                Vec::new()
            }
        }
    }

    /// Replace a user's history with `entries`
    pub fn save(&self, key: &str, entries: &[Entry]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);

        let tmp = NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut writer, entries)?;
            writer.flush()?;
        }
        tmp.persist(&path).map_err(|e| e.error)?;

        debug!(path = %path.display(), count = entries.len(), "Saved history");
        Ok(())
    }

    /// Read, append and write back; returns the updated history
    pub fn append(&self, key: &str, entry: Entry) -> Result<Vec<Entry>> {
        let mut history = self.load(key);
        history.push(entry);
        self.save(key, &history)?;
        Ok(history)
    }

    /// Storage keys that have a history file
    pub fn users(&self) -> Vec<String> {
        let Ok(read_dir) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };

        let mut users: Vec<String> = read_dir
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(String::from))
            .collect();
        users.sort();
        users
    }
}

use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::schema::LoggingConfig;
use crate::dashboard::FetchOutcome;

// ---------------------------------------------------------------------------
// Fetch log entry (JSONL)
// ---------------------------------------------------------------------------

/// A single entry in the fetch activity log (`~/.insightboard/fetch-log.jsonl`).
///
/// One entry per refresh attempt. Used by the reporter for
/// `insightboard history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchLogEntry {
    pub timestamp: String,
    /// Where the records came from (URL or file path).
    pub source: String,
    /// `"loaded"`, `"stale"`, or `"failed"`.
    pub outcome: String,
    #[serde(default)]
    pub records: usize,
    #[serde(default)]
    pub skipped: usize,
    #[serde(default)]
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl FetchLogEntry {
    /// Build an entry for `outcome`, stamped with the current time.
    pub fn from_outcome(source: &str, outcome: &FetchOutcome) -> Self {
        let mut entry = Self {
            timestamp: Utc::now().to_rfc3339(),
            source: source.to_string(),
            outcome: String::new(),
            records: 0,
            skipped: 0,
            latency_ms: 0,
            error: None,
        };
        match outcome {
            FetchOutcome::Loaded {
                records,
                skipped,
                latency_ms,
            } => {
                entry.outcome = "loaded".to_string();
                entry.records = *records;
                entry.skipped = *skipped;
                entry.latency_ms = *latency_ms;
            }
            FetchOutcome::Stale => entry.outcome = "stale".to_string(),
            FetchOutcome::Failed { error, latency_ms } => {
                entry.outcome = "failed".to_string();
                entry.error = Some(error.clone());
                entry.latency_ms = *latency_ms;
            }
        }
        entry
    }

    pub fn is_failure(&self) -> bool {
        self.outcome == "failed"
    }
}

// ---------------------------------------------------------------------------
// Logging functions
// ---------------------------------------------------------------------------

/// Record a refresh outcome. Best-effort: I/O errors are ignored so logging
/// never interferes with the dashboard.
pub fn log_fetch(config: &LoggingConfig, source: &str, outcome: &FetchOutcome) {
    if !config.enabled {
        return;
    }
    let Some(path) = log_path(config) else {
        return;
    };
    let _ = append_entry(&path, &FetchLogEntry::from_outcome(source, outcome));
}

// ---------------------------------------------------------------------------
// Reading log entries
// ---------------------------------------------------------------------------

/// Read all entries from the configured log.
///
/// Silently skips malformed lines. Returns an empty vec if the file does not
/// exist or cannot be read.
pub fn read_all_entries(config: &LoggingConfig) -> Vec<FetchLogEntry> {
    log_path(config)
        .map(|path| read_entries(&path))
        .unwrap_or_default()
}

fn read_entries(path: &Path) -> Vec<FetchLogEntry> {
    let Ok(file) = fs::File::open(path) else {
        return Vec::new();
    };

    BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| serde_json::from_str::<FetchLogEntry>(&line).ok())
        .collect()
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

fn append_entry(path: &Path, entry: &FetchLogEntry) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(entry)?;
    writeln!(file, "{json}")?;

    Ok(())
}

/// Resolve the configured log path, expanding a leading `~`.
pub fn log_path(config: &LoggingConfig) -> Option<PathBuf> {
    expand_home(&config.path)
}

fn expand_home(raw: &str) -> Option<PathBuf> {
    if raw.is_empty() {
        return None;
    }
    match raw.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None if raw == "~" => dirs::home_dir(),
        None => Some(PathBuf::from(raw)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

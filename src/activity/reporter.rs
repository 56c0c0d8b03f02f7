//! Fetch history reporter: aggregates the JSONL fetch log.

use crate::activity::logger::FetchLogEntry;

/// Summary statistics for `insightboard history`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchSummary {
    pub total: usize,
    pub loaded: usize,
    pub failed: usize,
    pub stale: usize,
    /// Mean latency over loaded fetches, in milliseconds.
    pub avg_latency_ms: f64,
    /// Timestamp of the most recent successful fetch.
    pub last_success: Option<String>,
    /// Most recent error message, if any fetch failed.
    pub last_error: Option<String>,
}

impl FetchSummary {
    /// Failure percentage, 0.0 when nothing was logged.
    pub fn failure_pct(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.failed as f64 / self.total as f64) * 100.0
        }
    }
}

/// Aggregate log entries, which are expected in append (chronological) order.
pub fn summarize(entries: &[FetchLogEntry]) -> FetchSummary {
    let mut summary = FetchSummary {
        total: entries.len(),
        ..FetchSummary::default()
    };
    let mut latency_total = 0u64;

    for entry in entries {
        match entry.outcome.as_str() {
            "loaded" => {
                summary.loaded += 1;
                latency_total += entry.latency_ms;
                summary.last_success = Some(entry.timestamp.clone());
            }
            "failed" => {
                summary.failed += 1;
                summary.last_error = entry.error.clone();
            }
            _ => summary.stale += 1,
        }
    }

    if summary.loaded > 0 {
        summary.avg_latency_ms = latency_total as f64 / summary.loaded as f64;
    }
    summary
}

/// The most recent `n` entries, newest first.
pub fn recent(entries: &[FetchLogEntry], n: usize) -> Vec<&FetchLogEntry> {
    entries.iter().rev().take(n).collect()
}

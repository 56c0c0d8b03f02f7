//! Fetch activity log: a JSONL record of every refresh and its summary.

pub mod logger;
pub mod reporter;

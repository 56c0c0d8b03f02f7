//! Insight record model.
//!
//! One [`Record`] is a single market/strategic observation as served by
//! `GET /api/data`. The upstream dataset is loosely typed: numbers arrive as
//! strings, empty strings stand in for missing values, and `topic` is
//! sometimes a bare string. Decoding normalizes all of that so the filter and
//! chart code only ever see:
//!
//! - `topic` as a list (possibly empty)
//! - categorical fields as `Option<String>`, never `Some("")`
//! - numeric fields as `Option<i64>`
//!
//! Records that cannot be decoded at all are skipped by [`decode_records`]
//! and counted in [`RecordBatch::skipped`].

pub mod timestamp;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// A single insight record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, deserialize_with = "de_title")]
    pub title: String,
    /// Zero or more topic tags. Always a list after decoding.
    #[serde(default, deserialize_with = "de_topics")]
    pub topic: Vec<String>,
    #[serde(default, deserialize_with = "de_text", skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(default, deserialize_with = "de_text", skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, deserialize_with = "de_text", skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "de_text", skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "de_text", skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// PEST category (Political, Economic, ...).
    #[serde(default, deserialize_with = "de_text", skip_serializing_if = "Option::is_none")]
    pub pestle: Option<String>,
    #[serde(default, deserialize_with = "de_text", skip_serializing_if = "Option::is_none")]
    pub swot: Option<String>,
    #[serde(default, deserialize_with = "de_int", skip_serializing_if = "Option::is_none")]
    pub intensity: Option<i64>,
    #[serde(default, deserialize_with = "de_int", skip_serializing_if = "Option::is_none")]
    pub relevance: Option<i64>,
    #[serde(default, deserialize_with = "de_int", skip_serializing_if = "Option::is_none")]
    pub likelihood: Option<i64>,
    #[serde(default, deserialize_with = "de_int", skip_serializing_if = "Option::is_none")]
    pub start_year: Option<i64>,
    #[serde(default, deserialize_with = "de_int", skip_serializing_if = "Option::is_none")]
    pub end_year: Option<i64>,
    /// Raw publication timestamp; see [`Record::published_at`].
    #[serde(default, deserialize_with = "de_text", skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    #[serde(default, deserialize_with = "de_text", skip_serializing_if = "Option::is_none")]
    pub added: Option<String>,
    #[serde(default, deserialize_with = "de_text", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Record {
    /// Build a record with only a title set. Mostly useful for tests and
    /// fixtures; chain struct-update syntax for the remaining fields.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Parsed publication instant, or `None` if absent or unparseable.
    pub fn published_at(&self) -> Option<NaiveDateTime> {
        self.published.as_deref().and_then(timestamp::parse)
    }

    /// Parsed "added" instant, or `None` if absent or unparseable.
    pub fn added_at(&self) -> Option<NaiveDateTime> {
        self.added.as_deref().and_then(timestamp::parse)
    }
}

// ---------------------------------------------------------------------------
// Batch decoding
// ---------------------------------------------------------------------------

/// Result of decoding a `/api/data` payload.
#[derive(Debug, Clone, Default)]
pub struct RecordBatch {
    pub records: Vec<Record>,
    /// Array elements that were not decodable as a record (e.g. not objects).
    pub skipped: usize,
}

/// Decode a JSON payload that must be an array of records.
///
/// Fails only if the payload itself is not an array. Individual elements
/// that do not decode are skipped.
pub fn decode_records(payload: Value) -> Result<RecordBatch> {
    let Value::Array(items) = payload else {
        anyhow::bail!("expected a JSON array of records, got {}", value_kind(&payload));
    };

    let mut batch = RecordBatch::default();
    for item in items {
        match serde_json::from_value::<Record>(item) {
            Ok(record) => batch.records.push(record),
            Err(_) => batch.skipped += 1,
        }
    }
    Ok(batch)
}

/// Decode a raw JSON text payload.
pub fn parse_records(raw: &str) -> Result<RecordBatch> {
    let payload: Value = serde_json::from_str(raw).context("record payload is not valid JSON")?;
    decode_records(payload)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Lenient field decoders
// ---------------------------------------------------------------------------

fn de_title<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

fn de_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn de_int<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn de_topics<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s],
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

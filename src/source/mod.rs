/// Record sources for the dashboard.
///
/// The production source is the insight API (`GET <base-url>/api/data`),
/// queried with the synchronous `ureq` client. A local JSON file source
/// covers offline use, and [`StaticSource`] serves fixed records.
///
/// All sources return a [`RecordBatch`]; transport and decoding failures are
/// surfaced as errors for the controller to report, never panics.
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::schema::SourceConfig;
use crate::filter::FilterCriteria;
use crate::model::{self, Record, RecordBatch};

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Anything that can produce the full record set.
pub trait DataSource {
    fn fetch(&self) -> Result<RecordBatch>;

    /// Human-readable origin, used in logs.
    fn describe(&self) -> String;

    /// Query parameters the source narrows its result with. Empty means the
    /// full record set is returned.
    fn pushdown(&self) -> &[(String, String)] {
        &[]
    }
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

/// Synchronous client for the insight data API.
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    timeout: Duration,
    query: Vec<(String, String)>,
}

impl HttpSource {
    /// Build a client from the resolved config.
    pub fn from_config(config: &SourceConfig) -> Self {
        let base = config.base_url.trim_end_matches('/');
        let path = config.data_path.trim_start_matches('/');
        Self {
            url: format!("{base}/{path}"),
            timeout: Duration::from_millis(config.timeout_ms),
            query: Vec::new(),
        }
    }

    /// Narrow the request with query parameters (see [`remote_query`]).
    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Check whether the API answers at all. Uses a short timeout.
    pub fn is_reachable(&self) -> bool {
        ureq::get(&self.url)
            .timeout(Duration::from_secs(3))
            .call()
            .is_ok()
    }
}

impl DataSource for HttpSource {
    fn fetch(&self) -> Result<RecordBatch> {
        let mut request = ureq::get(&self.url).timeout(self.timeout);
        for (key, value) in &self.query {
            request = request.query(key, value);
        }

        let resp = request
            .call()
            .with_context(|| format!("request to {} failed", self.url))?;

        let payload: serde_json::Value = resp
            .into_json()
            .with_context(|| format!("failed to parse JSON from {}", self.url))?;

        model::decode_records(payload)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }

    fn pushdown(&self) -> &[(String, String)] {
        &self.query
    }
}

/// Query parameters for the exact-match criteria the API understands.
///
/// Only fields the API compares by equality are pushed down; the client
/// filter still runs on the response, so the final result is the same
/// with or without pushdown. An end year that does not parse is not sent.
pub fn remote_query(criteria: &FilterCriteria) -> Vec<(String, String)> {
    let mut query = Vec::new();
    let end_year = criteria.end_year.trim();
    if end_year.parse::<i64>().is_ok() {
        query.push(("end_year".to_string(), end_year.to_string()));
    }
    let exact = [
        ("sector", &criteria.sector),
        ("region", &criteria.region),
        ("pest", &criteria.pest),
        ("swot", &criteria.swot),
        ("country", &criteria.country),
        ("city", &criteria.city),
    ];
    for (key, value) in exact {
        if !value.is_empty() {
            query.push((key.to_string(), value.clone()));
        }
    }
    query
}

// ---------------------------------------------------------------------------
// File
// ---------------------------------------------------------------------------

/// Reads the same JSON array payload from a local file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl DataSource for FileSource {
    fn fetch(&self) -> Result<RecordBatch> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        model::parse_records(&raw).with_context(|| format!("invalid data in {}", self.path.display()))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

// ---------------------------------------------------------------------------
// Static
// ---------------------------------------------------------------------------

/// Serves a fixed record set, or a fixed error.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    records: Vec<Record>,
    error: Option<String>,
    pushdown: Vec<(String, String)>,
}

impl StaticSource {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    /// A source whose every fetch fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Report `records` as already narrowed by `query`.
    pub fn with_pushdown(mut self, query: Vec<(String, String)>) -> Self {
        self.pushdown = query;
        self
    }
}

impl DataSource for StaticSource {
    fn fetch(&self) -> Result<RecordBatch> {
        if let Some(message) = &self.error {
            anyhow::bail!("{message}");
        }
        Ok(RecordBatch {
            records: self.records.clone(),
            skipped: 0,
        })
    }

    fn describe(&self) -> String {
        "static".to_string()
    }

    fn pushdown(&self) -> &[(String, String)] {
        &self.pushdown
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_joins_base_and_path() {
        let config = SourceConfig::default();
        let source = HttpSource::from_config(&config);
        assert_eq!(source.url(), "http://localhost:5000/api/data");
        assert_eq!(source.timeout, Duration::from_millis(10_000));
    }

    #[test]
    fn client_strips_extra_slashes() {
        let config = SourceConfig {
            base_url: "http://example.test/".to_string(),
            data_path: "/v2/insights".to_string(),
            ..SourceConfig::default()
        };
        assert_eq!(
            HttpSource::from_config(&config).url(),
            "http://example.test/v2/insights"
        );
    }

    #[test]
    fn remote_query_sends_only_exact_fields() {
        let criteria = FilterCriteria {
            search: "oil".to_string(),
            source: "EIA".to_string(),
            region: "Asia".to_string(),
            end_year: "2030".to_string(),
            ..FilterCriteria::default()
        };
        let query = remote_query(&criteria);
        assert_eq!(
            query,
            vec![
                ("end_year".to_string(), "2030".to_string()),
                ("region".to_string(), "Asia".to_string()),
            ]
        );
    }

    #[test]
    fn remote_query_skips_bad_end_year() {
        let criteria = FilterCriteria {
            end_year: "20x".to_string(),
            ..FilterCriteria::default()
        };
        assert!(remote_query(&criteria).is_empty());
    }

    #[test]
    fn file_source_reports_missing_file() {
        let source = FileSource::new("/nonexistent/insights.json");
        let err = source.fetch().unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn file_source_reads_payload() {
        let path = std::env::temp_dir().join(format!("insightboard-{}.json", std::process::id()));
        fs::write(&path, r#"[{"title": "A", "intensity": 3}, {"title": "B"}]"#).unwrap();
        let batch = FileSource::new(&path).fetch().unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.records[0].intensity, Some(3));
    }

    #[test]
    fn http_source_reports_its_query() {
        let source = HttpSource::from_config(&SourceConfig::default());
        assert!(source.pushdown().is_empty());
        let query = vec![("region".to_string(), "Asia".to_string())];
        assert_eq!(source.with_query(query.clone()).pushdown(), query.as_slice());
    }

    #[test]
    fn static_source_can_fail() {
        assert!(StaticSource::failing("down").fetch().is_err());
        let ok = StaticSource::new(vec![Record::titled("A")]).fetch().unwrap();
        assert_eq!(ok.records.len(), 1);
    }
}

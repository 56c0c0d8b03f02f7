//! Filter engine: criteria and the record predicate conjunction.
//!
//! [`apply`] is a pure, order-preserving filter. Every criterion has an
//! "empty" value that matches all records; a non-empty criterion is checked
//! against the corresponding record field, and an absent field never
//! satisfies a non-empty criterion.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::model::{Record, timestamp};

// ---------------------------------------------------------------------------
// Criteria
// ---------------------------------------------------------------------------

/// User-editable filter state. [`FilterCriteria::default`] matches everything.
///
/// Text fields hold what the user typed; parsing (dates, end year) happens
/// at filter time so a half-typed value never fails the whole pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    /// Case-insensitive substring of `title`.
    pub search: String,
    /// Lower bound (inclusive) on `published`.
    pub date_from: String,
    /// Upper bound (inclusive) on `published`.
    pub date_to: String,
    /// Exact `end_year`.
    pub end_year: String,
    /// Matches records carrying any of these topics.
    pub topics: Vec<String>,
    pub sector: String,
    pub region: String,
    /// Exact `pestle` category.
    pub pest: String,
    /// Case-insensitive substring of `source`.
    pub source: String,
    pub swot: String,
    pub country: String,
    pub city: String,
    /// Placeholder kept for API compatibility. Not applied: the filter
    /// always preserves input order.
    pub sort_by: String,
}

impl FilterCriteria {
    /// True when every criterion is at its "match everything" value.
    pub fn is_empty(&self) -> bool {
        let ignoring_sort = Self {
            sort_by: String::new(),
            ..self.clone()
        };
        ignoring_sort == Self::default()
    }

    /// Reset every field to its default.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Compile the criteria once for a filter pass.
    fn compile(&self) -> Compiled<'_> {
        Compiled {
            criteria: self,
            search: lowered(&self.search),
            source: lowered(&self.source),
            date_from: bound(&self.date_from),
            date_to: bound(&self.date_to),
            end_year: bound_with(&self.end_year, |s| s.parse::<i64>().ok()),
        }
    }
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Return the records that satisfy every criterion, in input order.
pub fn apply(records: &[Record], criteria: &FilterCriteria) -> Vec<Record> {
    let compiled = criteria.compile();
    records
        .iter()
        .filter(|r| compiled.matches(r))
        .cloned()
        .collect()
}

/// Check a single record against the criteria.
pub fn matches(record: &Record, criteria: &FilterCriteria) -> bool {
    criteria.compile().matches(record)
}

/// A parsed criterion bound.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Bound<T> {
    /// Criterion left empty: matches everything.
    Any,
    /// Criterion set to a value that could not be parsed: matches nothing.
    Invalid,
    Value(T),
}

fn bound(raw: &str) -> Bound<NaiveDateTime> {
    bound_with(raw, timestamp::parse)
}

fn bound_with<T>(raw: &str, parse: impl Fn(&str) -> Option<T>) -> Bound<T> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Bound::Any;
    }
    match parse(raw) {
        Some(value) => Bound::Value(value),
        None => Bound::Invalid,
    }
}

fn lowered(raw: &str) -> Option<String> {
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_lowercase())
    }
}

struct Compiled<'a> {
    criteria: &'a FilterCriteria,
    search: Option<String>,
    source: Option<String>,
    date_from: Bound<NaiveDateTime>,
    date_to: Bound<NaiveDateTime>,
    end_year: Bound<i64>,
}

impl Compiled<'_> {
    fn matches(&self, r: &Record) -> bool {
        let c = self.criteria;
        self.search_matches(r)
            && self.dates_match(r)
            && self.end_year_matches(r)
            && topics_match(&r.topic, &c.topics)
            && equals(r.sector.as_deref(), &c.sector)
            && equals(r.region.as_deref(), &c.region)
            && equals(r.pestle.as_deref(), &c.pest)
            && equals(r.swot.as_deref(), &c.swot)
            && equals(r.country.as_deref(), &c.country)
            && equals(r.city.as_deref(), &c.city)
            && contains_lowered(r.source.as_deref(), self.source.as_deref())
    }

    fn search_matches(&self, r: &Record) -> bool {
        contains_lowered(Some(&r.title), self.search.as_deref())
    }

    fn dates_match(&self, r: &Record) -> bool {
        if self.date_from == Bound::Any && self.date_to == Bound::Any {
            return true;
        }
        let Some(published) = r.published_at() else {
            return false;
        };
        let after_from = match self.date_from {
            Bound::Any => true,
            Bound::Invalid => false,
            Bound::Value(from) => published >= from,
        };
        let before_to = match self.date_to {
            Bound::Any => true,
            Bound::Invalid => false,
            Bound::Value(to) => published <= to,
        };
        after_from && before_to
    }

    fn end_year_matches(&self, r: &Record) -> bool {
        match self.end_year {
            Bound::Any => true,
            Bound::Invalid => false,
            Bound::Value(year) => r.end_year == Some(year),
        }
    }
}

fn equals(field: Option<&str>, wanted: &str) -> bool {
    wanted.is_empty() || field == Some(wanted)
}

fn contains_lowered(field: Option<&str>, needle: Option<&str>) -> bool {
    match needle {
        None => true,
        Some(needle) => field.is_some_and(|f| f.to_lowercase().contains(needle)),
    }
}

fn topics_match(record_topics: &[String], wanted: &[String]) -> bool {
    wanted.is_empty() || wanted.iter().any(|t| record_topics.contains(t))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str) -> Record {
        Record::titled(title)
    }

    #[test]
    fn default_criteria_is_empty() {
        assert!(FilterCriteria::default().is_empty());
        let sorted = FilterCriteria {
            sort_by: "title".to_string(),
            ..FilterCriteria::default()
        };
        assert!(sorted.is_empty());
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let c = FilterCriteria {
            search: "OIL".to_string(),
            ..FilterCriteria::default()
        };
        assert!(matches(&record("Crude oil output"), &c));
        assert!(!matches(&record("Gas prices"), &c));
    }

    #[test]
    fn date_bounds_are_inclusive() {
        let r = Record {
            published: Some("2020-06-01".to_string()),
            ..record("r")
        };
        let c = FilterCriteria {
            date_from: "2020-06-01".to_string(),
            date_to: "2020-06-01".to_string(),
            ..FilterCriteria::default()
        };
        assert!(matches(&r, &c));
    }

    #[test]
    fn unparseable_published_fails_date_bound() {
        let r = Record {
            published: Some("sometime".to_string()),
            ..record("r")
        };
        let c = FilterCriteria {
            date_to: "2030-01-01".to_string(),
            ..FilterCriteria::default()
        };
        assert!(!matches(&r, &c));
        assert!(matches(&r, &FilterCriteria::default()));
    }

    #[test]
    fn unparseable_bound_matches_nothing() {
        let r = Record {
            published: Some("2020-01-01".to_string()),
            end_year: Some(2025),
            ..record("r")
        };
        let bad_date = FilterCriteria {
            date_from: "yesterday".to_string(),
            ..FilterCriteria::default()
        };
        let bad_year = FilterCriteria {
            end_year: "soon".to_string(),
            ..FilterCriteria::default()
        };
        assert!(!matches(&r, &bad_date));
        assert!(!matches(&r, &bad_year));
    }

    #[test]
    fn end_year_requires_present_value() {
        let c = FilterCriteria {
            end_year: "2025".to_string(),
            ..FilterCriteria::default()
        };
        let with = Record {
            end_year: Some(2025),
            ..record("a")
        };
        assert!(matches(&with, &c));
        assert!(!matches(&record("b"), &c));
    }

    #[test]
    fn categorical_filters_require_exact_match() {
        let r = Record {
            region: Some("Asia".to_string()),
            pestle: Some("Economic".to_string()),
            ..record("r")
        };
        let c = FilterCriteria {
            region: "Asia".to_string(),
            pest: "Economic".to_string(),
            ..FilterCriteria::default()
        };
        assert!(matches(&r, &c));

        let lower = FilterCriteria {
            region: "asia".to_string(),
            ..FilterCriteria::default()
        };
        assert!(!matches(&r, &lower));
    }

    #[test]
    fn absent_categorical_never_matches_non_empty_filter() {
        let c = FilterCriteria {
            swot: "Threats".to_string(),
            ..FilterCriteria::default()
        };
        assert!(!matches(&record("r"), &c));
    }

    #[test]
    fn source_is_case_insensitive_substring() {
        let r = Record {
            source: Some("EIA Reports".to_string()),
            ..record("r")
        };
        let c = FilterCriteria {
            source: "eia".to_string(),
            ..FilterCriteria::default()
        };
        assert!(matches(&r, &c));
        assert!(!matches(&record("no source"), &c));
    }

    #[test]
    fn clear_resets_everything() {
        let mut c = FilterCriteria {
            search: "x".to_string(),
            topics: vec!["oil".to_string()],
            ..FilterCriteria::default()
        };
        c.clear();
        assert_eq!(c, FilterCriteria::default());
    }
}

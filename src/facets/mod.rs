//! Facet extraction: distinct values per categorical field.
//!
//! Facets populate the filter controls. Values keep first-seen order and
//! are duplicate-free; absent values are skipped. End years are the one
//! exception to first-seen order: they are sorted ascending.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::model::Record;

/// Fixed PEST taxonomy offered for the `pest` filter.
pub const PEST_OPTIONS: [&str; 4] = ["Political", "Economic", "Social", "Technological"];

/// Fixed SWOT taxonomy offered for the `swot` filter.
pub const SWOT_OPTIONS: [&str; 4] = ["Strengths", "Weaknesses", "Opportunities", "Threats"];

/// Distinct values observed for each categorical field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FacetSet {
    pub topics: Vec<String>,
    pub sectors: Vec<String>,
    pub regions: Vec<String>,
    pub countries: Vec<String>,
    pub cities: Vec<String>,
    pub sources: Vec<String>,
    pub pestles: Vec<String>,
    pub swots: Vec<String>,
    pub end_years: Vec<i64>,
}

impl FacetSet {
    /// Total number of distinct values across all facets.
    pub fn len(&self) -> usize {
        self.topics.len()
            + self.sectors.len()
            + self.regions.len()
            + self.countries.len()
            + self.cities.len()
            + self.sources.len()
            + self.pestles.len()
            + self.swots.len()
            + self.end_years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Extract the facet set from the full record collection.
pub fn extract(records: &[Record]) -> FacetSet {
    let mut end_years = BTreeSet::new();
    for year in records.iter().filter_map(|r| r.end_year) {
        end_years.insert(year);
    }

    FacetSet {
        topics: distinct(records.iter().flat_map(|r| r.topic.iter().map(String::as_str))),
        sectors: distinct(records.iter().filter_map(|r| r.sector.as_deref())),
        regions: distinct(records.iter().filter_map(|r| r.region.as_deref())),
        countries: distinct(records.iter().filter_map(|r| r.country.as_deref())),
        cities: distinct(records.iter().filter_map(|r| r.city.as_deref())),
        sources: distinct(records.iter().filter_map(|r| r.source.as_deref())),
        pestles: distinct(records.iter().filter_map(|r| r.pestle.as_deref())),
        swots: distinct(records.iter().filter_map(|r| r.swot.as_deref())),
        end_years: end_years.into_iter().collect(),
    }
}

/// Deduplicate values, keeping the first occurrence of each.
pub fn distinct<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}

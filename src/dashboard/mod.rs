//! Dashboard controller: the single owner of dashboard state.
//!
//! Holds the fetched records, the filter criteria and the selected chart
//! type, plus everything derived from them (facets, filtered records,
//! chart spec). State only changes through the transition methods:
//!
//! - [`receive_data`](DashboardController::receive_data): new record set;
//!   recomputes facets, filtered records and chart
//! - [`set_criteria`](DashboardController::set_criteria) /
//!   [`update_criteria`](DashboardController::update_criteria) /
//!   [`clear_filters`](DashboardController::clear_filters): re-filter and
//!   rebuild the chart
//! - [`set_chart_type`](DashboardController::set_chart_type): rebuild the
//!   chart only
//!
//! A transition whose input did not actually change recomputes nothing.
//!
//! Fetches are tagged with a monotonic ticket; a response carrying a ticket
//! older than the last applied one is discarded.
//!
//! A record set the source narrowed with a pushdown query remembers that
//! query. Facets always come from the last full record set, and
//! [`needs_refetch`](DashboardController::needs_refetch) reports when the
//! criteria no longer imply the narrowing.

use std::time::Instant;

use crate::chart::{self, ChartSpec, ChartType};
use crate::config::schema::ChartConfig;
use crate::facets::{self, FacetSet};
use crate::filter::{self, FilterCriteria};
use crate::model::Record;
use crate::source::{self, DataSource};

/// Number of records shown in the data preview.
pub const PREVIEW_LEN: usize = 5;

/// Sequence number identifying one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

/// Result of a refresh attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// New records were applied.
    Loaded {
        records: usize,
        skipped: usize,
        latency_ms: u64,
    },
    /// A newer fetch was already applied; this response was dropped.
    Stale,
    /// The fetch failed; prior state is untouched.
    Failed { error: String, latency_ms: u64 },
}

impl FetchOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }
}

/// Dashboard state plus its derived outputs.
#[derive(Debug, Clone)]
pub struct DashboardController {
    records: Vec<Record>,
    criteria: FilterCriteria,
    chart_type: ChartType,
    chart_config: ChartConfig,

    facets: FacetSet,
    filtered: Vec<Record>,
    spec: ChartSpec,

    next_ticket: u64,
    applied_ticket: Option<FetchTicket>,
    /// Query the current records were narrowed with.
    pushdown: Vec<(String, String)>,
}

impl Default for DashboardController {
    fn default() -> Self {
        Self::new(ChartConfig::default())
    }
}

impl DashboardController {
    /// Empty dashboard showing the configured default chart type.
    pub fn new(chart_config: ChartConfig) -> Self {
        let chart_type = chart_config.default_type;
        let spec = chart::build_with(&[], chart_type, &chart_config);
        Self {
            records: Vec::new(),
            criteria: FilterCriteria::default(),
            chart_type,
            chart_config,
            facets: FacetSet::default(),
            filtered: Vec::new(),
            spec,
            next_ticket: 0,
            applied_ticket: None,
            pushdown: Vec::new(),
        }
    }

    // -- accessors ----------------------------------------------------------

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn chart_type(&self) -> ChartType {
        self.chart_type
    }

    pub fn chart_config(&self) -> &ChartConfig {
        &self.chart_config
    }

    pub fn facets(&self) -> &FacetSet {
        &self.facets
    }

    pub fn filtered(&self) -> &[Record] {
        &self.filtered
    }

    pub fn chart(&self) -> &ChartSpec {
        &self.spec
    }

    /// Pushdown query of the loaded records; empty for a full record set.
    pub fn pushdown(&self) -> &[(String, String)] {
        &self.pushdown
    }

    /// True when the records were narrowed by a query parameter the current
    /// criteria no longer carry, so filtering them would miss rows.
    pub fn needs_refetch(&self) -> bool {
        let wanted = source::remote_query(&self.criteria);
        self.pushdown.iter().any(|pair| !wanted.contains(pair))
    }

    /// The first `n` filtered records.
    pub fn preview(&self, n: usize) -> &[Record] {
        &self.filtered[..n.min(self.filtered.len())]
    }

    // -- transitions --------------------------------------------------------

    /// Reserve a ticket for a fetch about to start.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.next_ticket += 1;
        FetchTicket(self.next_ticket)
    }

    /// Apply a full record set. Returns `false` (and changes nothing) if a
    /// newer fetch has already been applied.
    pub fn receive_data(&mut self, ticket: FetchTicket, records: Vec<Record>) -> bool {
        self.receive_narrowed(ticket, records, Vec::new())
    }

    /// Apply a record set the source narrowed with `pushdown`.
    ///
    /// Facets are only recomputed from a full set; a narrowed set keeps the
    /// previous facets unless none were ever derived.
    pub fn receive_narrowed(
        &mut self,
        ticket: FetchTicket,
        records: Vec<Record>,
        pushdown: Vec<(String, String)>,
    ) -> bool {
        if self.applied_ticket.is_some_and(|applied| ticket < applied) {
            return false;
        }
        self.applied_ticket = Some(ticket);
        if pushdown.is_empty() || self.facets.is_empty() {
            self.facets = facets::extract(&records);
        }
        self.records = records;
        self.pushdown = pushdown;
        self.refilter();
        true
    }

    /// Replace the criteria wholesale.
    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        if criteria == self.criteria {
            return;
        }
        self.criteria = criteria;
        self.refilter();
    }

    /// Mutate individual criteria fields.
    pub fn update_criteria(&mut self, update: impl FnOnce(&mut FilterCriteria)) {
        let mut criteria = self.criteria.clone();
        update(&mut criteria);
        self.set_criteria(criteria);
    }

    /// Reset the criteria to "match everything".
    pub fn clear_filters(&mut self) {
        self.set_criteria(FilterCriteria::default());
    }

    pub fn set_chart_type(&mut self, chart_type: ChartType) {
        if chart_type == self.chart_type {
            return;
        }
        self.chart_type = chart_type;
        self.rebuild_chart();
    }

    /// Fetch from `source` and apply the result.
    ///
    /// Failures are returned as [`FetchOutcome::Failed`] and leave the
    /// currently displayed data in place.
    pub fn refresh(&mut self, source: &dyn DataSource) -> FetchOutcome {
        let ticket = self.begin_fetch();
        let started = Instant::now();
        let result = source.fetch();
        let latency_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(batch) => {
                let records = batch.records.len();
                let pushdown = source.pushdown().to_vec();
                if self.receive_narrowed(ticket, batch.records, pushdown) {
                    FetchOutcome::Loaded {
                        records,
                        skipped: batch.skipped,
                        latency_ms,
                    }
                } else {
                    FetchOutcome::Stale
                }
            }
            Err(e) => FetchOutcome::Failed {
                error: format!("{e:#}"),
                latency_ms,
            },
        }
    }

    // -- derivation ---------------------------------------------------------

    fn refilter(&mut self) {
        self.filtered = filter::apply(&self.records, &self.criteria);
        self.rebuild_chart();
    }

    fn rebuild_chart(&mut self) {
        self.spec = chart::build_with(&self.filtered, self.chart_type, &self.chart_config);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

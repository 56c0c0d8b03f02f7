//! JSON API handlers for the web dashboard.
//!
//! Each handler corresponds to an API endpoint and returns a
//! `Response<Cursor<Vec<u8>>>` with JSON content.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::activity::logger::{self, FetchLogEntry};
use crate::chart::{self, ChartSpec, ChartType};
use crate::config::{self, BoardConfig};
use crate::dashboard::{FetchOutcome, PREVIEW_LEN};
use crate::facets::{FacetSet, PEST_OPTIONS, SWOT_OPTIONS};
use crate::filter::FilterCriteria;
use crate::model::Record;

use super::{HttpResponse, WebState, error_response, respond};

// ---------------------------------------------------------------------------
// JSON response types
// ---------------------------------------------------------------------------

/// Everything the page needs to redraw after any change.
#[derive(Serialize)]
struct ViewResponse<'a> {
    criteria: &'a FilterCriteria,
    chart_type: ChartType,
    chart_types: Vec<&'static str>,
    options: OptionsResponse<'a>,
    chart: &'a ChartSpec,
    preview: &'a [Record],
    total: usize,
    matched: usize,
    last_fetch: Option<&'a FetchLogEntry>,
}

/// Selectable values for each filter control.
#[derive(Serialize)]
struct OptionsResponse<'a> {
    facets: &'a FacetSet,
    pest: &'static [&'static str],
    swot: &'static [&'static str],
}

#[derive(Serialize)]
struct RecordsResponse<'a> {
    total: usize,
    matched: usize,
    records: &'a [Record],
}

#[derive(Serialize)]
struct RefreshResponse<'a> {
    outcome: &'a FetchLogEntry,
    view: ViewResponse<'a>,
}

/// Config API response: the effective config plus its TOML rendering.
#[derive(Serialize)]
struct ConfigResponse<'a> {
    config: &'a BoardConfig,
    toml_text: String,
}

#[derive(Serialize)]
struct HealthResponse<'a> {
    source_url: String,
    source_reachable: bool,
    server_side_filters: bool,
    config_exists: bool,
    log_enabled: bool,
    log_exists: bool,
    records: usize,
    last_fetch: Option<&'a FetchLogEntry>,
}

/// Chart type change request: `{ "chart_type": "pie" }`.
#[derive(Deserialize)]
struct ChartTypeRequest {
    chart_type: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a JSON success response.
fn json_response<T: Serialize>(data: &T) -> Result<HttpResponse> {
    let body = serde_json::to_string(data).context("failed to serialize JSON response")?;
    Ok(respond(200, "application/json; charset=utf-8", body.into_bytes()))
}

/// 400 for a request body that does not decode.
fn bad_request(what: &str, err: &serde_json::Error) -> HttpResponse {
    error_response(400, &format!("invalid JSON in {what} request: {err}"))
}

/// Extract a raw query parameter value from a URL.
fn query_param<'a>(url: &'a str, key: &str) -> Option<&'a str> {
    url.split_once('?')?.1.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then_some(v)
    })
}

fn view(state: &WebState) -> ViewResponse<'_> {
    let board = &state.board;
    ViewResponse {
        criteria: board.criteria(),
        chart_type: board.chart_type(),
        chart_types: ChartType::ALL.iter().map(|t| t.as_str()).collect(),
        options: options(state),
        chart: board.chart(),
        preview: board.preview(PREVIEW_LEN),
        total: board.records().len(),
        matched: board.filtered().len(),
        last_fetch: state.last_fetch.as_ref(),
    }
}

fn options(state: &WebState) -> OptionsResponse<'_> {
    OptionsResponse {
        facets: state.board.facets(),
        pest: &PEST_OPTIONS,
        swot: &SWOT_OPTIONS,
    }
}

// ---------------------------------------------------------------------------
// API Handlers
// ---------------------------------------------------------------------------

/// `GET /api/view`: criteria, options, chart and preview in one payload.
pub fn get_view(state: &WebState) -> Result<HttpResponse> {
    json_response(&view(state))
}

/// `GET /api/records?limit=N`: the filtered records.
pub fn get_records(state: &WebState, url: &str) -> Result<HttpResponse> {
    let board = &state.board;
    let limit = query_param(url, "limit")
        .and_then(|v| v.parse().ok())
        .unwrap_or(usize::MAX);
    json_response(&RecordsResponse {
        total: board.records().len(),
        matched: board.filtered().len(),
        records: board.preview(limit),
    })
}

/// `GET /api/facets`: distinct values for the filter controls.
pub fn get_facets(state: &WebState) -> Result<HttpResponse> {
    json_response(&options(state))
}

/// `GET /api/chart?type=T`: the current chart, or the filtered records
/// drawn as `T`. An unrecognized `T` yields an empty spec.
pub fn get_chart(state: &WebState, url: &str) -> Result<HttpResponse> {
    match query_param(url, "type") {
        Some(name) => json_response(&chart::build_named(
            state.board.filtered(),
            name,
            state.board.chart_config(),
        )),
        None => json_response(state.board.chart()),
    }
}

/// `PUT /api/criteria`: replace the filter criteria.
///
/// Expects a JSON [`FilterCriteria`]; omitted fields are empty.
pub fn put_criteria(state: &mut WebState, body: &str) -> Result<HttpResponse> {
    let criteria: FilterCriteria = match serde_json::from_str(body) {
        Ok(criteria) => criteria,
        Err(e) => return Ok(bad_request("criteria", &e)),
    };
    state.set_criteria(criteria);
    json_response(&view(state))
}

/// `POST /api/criteria/clear`: reset every filter.
pub fn post_clear(state: &mut WebState) -> Result<HttpResponse> {
    state.clear_filters();
    json_response(&view(state))
}

/// `PUT /api/chart-type`: switch the chart type.
pub fn put_chart_type(state: &mut WebState, body: &str) -> Result<HttpResponse> {
    let req: ChartTypeRequest = match serde_json::from_str(body) {
        Ok(req) => req,
        Err(e) => return Ok(bad_request("chart type", &e)),
    };
    let Some(chart_type) = ChartType::from_str_opt(&req.chart_type) else {
        return Ok(error_response(
            400,
            &format!("unknown chart type '{}'", req.chart_type),
        ));
    };
    state.board.set_chart_type(chart_type);
    json_response(&view(state))
}

/// `POST /api/refresh`: refetch from the data API.
///
/// A failed fetch still answers 200 with the failure in `outcome`; the
/// previously loaded records stay in the view.
pub fn post_refresh(state: &mut WebState) -> Result<HttpResponse> {
    if let FetchOutcome::Failed { error, .. } = state.refresh() {
        println!("refresh failed: {error}");
    }
    let Some(outcome) = state.last_fetch.as_ref() else {
        anyhow::bail!("refresh did not record an outcome");
    };
    json_response(&RefreshResponse {
        outcome,
        view: view(state),
    })
}

/// `GET /api/config`: effective configuration.
pub fn get_config(state: &WebState) -> Result<HttpResponse> {
    let toml_text = toml::to_string_pretty(&state.config).unwrap_or_default();
    json_response(&ConfigResponse {
        config: &state.config,
        toml_text,
    })
}

/// `GET /api/health`: data source and file checks.
pub fn get_health(state: &WebState) -> Result<HttpResponse> {
    let http = state.http_source();
    let config_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let log_exists = logger::log_path(&state.config.logging)
        .map(|p| p.exists())
        .unwrap_or(false);

    json_response(&HealthResponse {
        source_url: http.url().to_string(),
        source_reachable: http.is_reachable(),
        server_side_filters: state.config.source.server_side_filters,
        config_exists,
        log_enabled: state.config.logging.enabled,
        log_exists,
        records: state.board.records().len(),
        last_fetch: state.last_fetch.as_ref(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

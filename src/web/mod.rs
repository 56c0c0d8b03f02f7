//! Embedded web dashboard for insightboard.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - A single-page dashboard that draws the chart spec as SVG
//! - JSON API endpoints for the view, records, facets, criteria and chart type
//!
//! Launched via `insightboard serve` (default: `http://127.0.0.1:9750`).
//! The server owns one [`DashboardController`]; requests are handled
//! sequentially, so every handler sees a consistent state.

mod api;
mod frontend;

use std::io::Cursor;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::activity::logger::{self, FetchLogEntry};
use crate::config::BoardConfig;
use crate::dashboard::{DashboardController, FetchOutcome};
use crate::filter::FilterCriteria;
use crate::source::{self, DataSource, HttpSource};

type HttpResponse = Response<Cursor<Vec<u8>>>;

// ---------------------------------------------------------------------------
// Server state
// ---------------------------------------------------------------------------

/// Everything the request handlers read and mutate.
pub struct WebState {
    board: DashboardController,
    config: BoardConfig,
    last_fetch: Option<FetchLogEntry>,
}

impl WebState {
    pub fn new(config: BoardConfig) -> Self {
        Self {
            board: DashboardController::new(config.chart.clone()),
            config,
            last_fetch: None,
        }
    }

    pub fn board(&self) -> &DashboardController {
        &self.board
    }

    /// The configured API source, narrowed by the current criteria when
    /// server-side filtering is on.
    fn http_source(&self) -> HttpSource {
        let http = HttpSource::from_config(&self.config.source);
        if self.config.source.server_side_filters {
            http.with_query(source::remote_query(self.board.criteria()))
        } else {
            http
        }
    }

    /// Replace the criteria. If the loaded records were narrowed by a
    /// filter the new criteria drop, refetch so nothing stays hidden.
    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        self.board.set_criteria(criteria);
        if self.board.needs_refetch()
            && let FetchOutcome::Failed { error, .. } = self.refresh()
        {
            println!("refetch after criteria change failed: {error}");
        }
    }

    pub fn clear_filters(&mut self) {
        self.set_criteria(FilterCriteria::default());
    }

    /// Refetch from the configured API.
    pub fn refresh(&mut self) -> FetchOutcome {
        let http = self.http_source();
        self.refresh_from(&http)
    }

    /// Refetch from `source`, logging the outcome. A failed fetch keeps the
    /// previously loaded records on screen.
    pub fn refresh_from(&mut self, source: &dyn DataSource) -> FetchOutcome {
        let outcome = self.board.refresh(source);
        let described = source.describe();
        logger::log_fetch(&self.config.logging, &described, &outcome);
        self.last_fetch = Some(FetchLogEntry::from_outcome(&described, &outcome));
        outcome
    }
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the dashboard server with the resolved config.
///
/// Blocks the current thread. Loads the data once before accepting
/// requests, then handles requests sequentially. Errors are answered per
/// request without stopping the server.
pub fn serve(config: BoardConfig) -> Result<()> {
    let addr = config.web.addr.clone();
    let open = config.web.open_browser;
    let server = Server::http(&addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    let mut state = WebState::new(config);
    match state.refresh() {
        FetchOutcome::Loaded { records, .. } => println!("loaded {records} records"),
        FetchOutcome::Failed { error, .. } => println!("warning: initial fetch failed: {error}"),
        FetchOutcome::Stale => {}
    }

    println!("insightboard dashboard running at http://{addr}");
    println!("Press Ctrl+C to stop.\n");

    if open {
        let _ = open_browser(&format!("http://{addr}"));
    }

    for mut request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();

        let body = if matches!(method, Method::Put | Method::Post | Method::Patch) {
            let mut buf = String::new();
            let _ = request.as_reader().read_to_string(&mut buf);
            Some(buf)
        } else {
            None
        };

        let resp = match dispatch(&mut state, &method, &url, body.as_deref()) {
            Ok(resp) => resp,
            Err(e) => error_response(500, &format!("{e:#}")),
        };
        let status = resp.status_code().0;
        let _ = request.respond(resp);

        println!(
            "{} {} {} {}",
            method,
            url,
            status,
            chrono::Local::now().format("%H:%M:%S")
        );
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatch an incoming request to the appropriate handler.
fn dispatch(
    state: &mut WebState,
    method: &Method,
    url: &str,
    body: Option<&str>,
) -> Result<HttpResponse> {
    let path = url.split('?').next().unwrap_or(url);

    match (method, path) {
        (&Method::Get, "/") | (&Method::Get, "/index.html") => Ok(serve_frontend()),

        // API: data
        (&Method::Get, "/api/view") => api::get_view(state),
        (&Method::Get, "/api/records") => api::get_records(state, url),
        (&Method::Get, "/api/facets") => api::get_facets(state),
        (&Method::Get, "/api/chart") => api::get_chart(state, url),
        (&Method::Post, "/api/refresh") => api::post_refresh(state),

        // API: view state
        (&Method::Put, "/api/criteria") => api::put_criteria(state, body.unwrap_or("{}")),
        (&Method::Post, "/api/criteria/clear") => api::post_clear(state),
        (&Method::Put, "/api/chart-type") => api::put_chart_type(state, body.unwrap_or("{}")),

        // API: config and health
        (&Method::Get, "/api/config") => api::get_config(state),
        (&Method::Get, "/api/health") => api::get_health(state),

        _ => Ok(not_found()),
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn serve_frontend() -> HttpResponse {
    respond(
        200,
        "text/html; charset=utf-8",
        frontend::INDEX_HTML.as_bytes().to_vec(),
    )
}

fn not_found() -> HttpResponse {
    error_response(404, "not found")
}

/// JSON error body with the given status.
pub(crate) fn error_response(status: u16, message: &str) -> HttpResponse {
    let body = serde_json::json!({ "error": message }).to_string();
    respond(status, "application/json; charset=utf-8", body.into_bytes())
}

/// Build a response with a content type header.
pub(crate) fn respond(status: u16, content_type: &str, body: Vec<u8>) -> HttpResponse {
    let mut resp = Response::from_data(body).with_status_code(StatusCode(status));
    if let Ok(header) = Header::from_bytes("Content-Type", content_type) {
        resp.add_header(header);
    }
    resp
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartType;
    use crate::model::Record;
    use crate::source::StaticSource;

    fn state() -> WebState {
        let mut config = BoardConfig::default();
        config.logging.enabled = false;
        let mut state = WebState::new(config);
        let records = vec![
            Record {
                region: Some("Asia".to_string()),
                intensity: Some(6),
                ..Record::titled("Oil output")
            },
            Record {
                region: Some("Europe".to_string()),
                intensity: Some(2),
                ..Record::titled("Gas prices")
            },
        ];
        assert!(state.refresh_from(&StaticSource::new(records)).is_loaded());
        state
    }

    fn status(resp: &HttpResponse) -> u16 {
        resp.status_code().0
    }

    #[test]
    fn serves_frontend_and_view() {
        let mut s = state();
        let resp = dispatch(&mut s, &Method::Get, "/", None).unwrap();
        assert_eq!(status(&resp), 200);
        let resp = dispatch(&mut s, &Method::Get, "/api/view", None).unwrap();
        assert_eq!(status(&resp), 200);
    }

    #[test]
    fn unknown_route_is_404() {
        let mut s = state();
        let resp = dispatch(&mut s, &Method::Get, "/api/nope", None).unwrap();
        assert_eq!(status(&resp), 404);
        let resp = dispatch(&mut s, &Method::Delete, "/api/view", None).unwrap();
        assert_eq!(status(&resp), 404);
    }

    #[test]
    fn criteria_route_refilters() {
        let mut s = state();
        let body = r#"{"region": "Asia"}"#;
        let resp = dispatch(&mut s, &Method::Put, "/api/criteria?x=1", Some(body)).unwrap();
        assert_eq!(status(&resp), 200);
        assert_eq!(s.board().filtered().len(), 1);

        dispatch(&mut s, &Method::Post, "/api/criteria/clear", None).unwrap();
        assert_eq!(s.board().filtered().len(), 2);
    }

    #[test]
    fn chart_type_route_validates_name() {
        let mut s = state();
        let resp = dispatch(
            &mut s,
            &Method::Put,
            "/api/chart-type",
            Some(r#"{"chart_type": "radar"}"#),
        )
        .unwrap();
        assert_eq!(status(&resp), 400);
        assert_eq!(s.board().chart_type(), ChartType::Bar);

        let resp = dispatch(
            &mut s,
            &Method::Put,
            "/api/chart-type",
            Some(r#"{"chart_type": "pie"}"#),
        )
        .unwrap();
        assert_eq!(status(&resp), 200);
        assert_eq!(s.board().chart_type(), ChartType::Pie);
    }

    #[test]
    fn malformed_bodies_are_bad_requests() {
        let mut s = state();
        let resp = dispatch(&mut s, &Method::Put, "/api/criteria", Some("{oops")).unwrap();
        assert_eq!(status(&resp), 400);
        let resp = dispatch(&mut s, &Method::Put, "/api/chart-type", Some("[]")).unwrap();
        assert_eq!(status(&resp), 400);
        assert_eq!(s.board().filtered().len(), 2);
    }

    /// Serve `records` on a local port, honouring a `region=` query the way
    /// the data API does. Returns the base URL.
    fn serve_records(records: Vec<Record>) -> String {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let addr = format!("127.0.0.1:{port}");
        let server = Server::http(&addr).unwrap();
        std::thread::spawn(move || {
            for request in server.incoming_requests() {
                let region = request.url().split_once('?').and_then(|(_, query)| {
                    query
                        .split('&')
                        .find_map(|pair| pair.strip_prefix("region="))
                        .map(str::to_string)
                });
                let rows: Vec<&Record> = records
                    .iter()
                    .filter(|r| {
                        region
                            .as_deref()
                            .is_none_or(|want| r.region.as_deref() == Some(want))
                    })
                    .collect();
                let body = serde_json::to_string(&rows).unwrap();
                let _ = request.respond(respond(200, "application/json", body.into_bytes()));
            }
        });
        format!("http://{addr}")
    }

    #[test]
    fn dropping_pushed_down_filter_refetches_full_set() {
        let records = vec![
            Record {
                region: Some("Asia".to_string()),
                intensity: Some(6),
                ..Record::titled("Oil output")
            },
            Record {
                region: Some("Europe".to_string()),
                intensity: Some(2),
                ..Record::titled("Gas prices")
            },
        ];
        let mut config = BoardConfig::default();
        config.logging.enabled = false;
        config.source.base_url = serve_records(records);
        config.source.server_side_filters = true;

        let mut s = WebState::new(config);
        assert!(s.refresh().is_loaded());
        assert_eq!(s.board().records().len(), 2);

        let body = r#"{"region": "Asia"}"#;
        dispatch(&mut s, &Method::Put, "/api/criteria", Some(body)).unwrap();
        dispatch(&mut s, &Method::Post, "/api/refresh", None).unwrap();
        assert_eq!(s.board().records().len(), 1);
        assert_eq!(s.board().facets().regions, vec!["Asia", "Europe"]);

        let body = r#"{"region": "Europe"}"#;
        dispatch(&mut s, &Method::Put, "/api/criteria", Some(body)).unwrap();
        assert_eq!(s.board().filtered().len(), 1);
        assert_eq!(s.board().filtered()[0].title, "Gas prices");

        dispatch(&mut s, &Method::Post, "/api/criteria/clear", None).unwrap();
        assert_eq!(s.board().records().len(), 2);
        assert_eq!(s.board().filtered().len(), 2);
        assert_eq!(s.board().facets().regions, vec!["Asia", "Europe"]);
    }

    #[test]
    fn failed_refresh_keeps_records() {
        let mut s = state();
        let outcome = s.refresh_from(&StaticSource::failing("connection refused"));
        assert!(!outcome.is_loaded());
        assert_eq!(s.board().records().len(), 2);
        assert!(s.last_fetch.as_ref().is_some_and(|e| e.is_failure()));
    }
}

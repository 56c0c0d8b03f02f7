//! CLI command implementations.
//!
//! Provides subcommand handlers for:
//! - `insightboard serve`: interactive web dashboard
//! - `insightboard records`: filtered records as a table, JSON or CSV
//! - `insightboard facets`: distinct values per filter field
//! - `insightboard chart --type T`: chart spec for the filtered records
//! - `insightboard health`: data source, config and log checks
//! - `insightboard history`: fetch activity summary
//! - `insightboard config show|init|set|reset`: configuration management

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

use crate::activity::{logger, reporter};
use crate::chart::{self, ChartSpec, ChartType, Marks};
use crate::config::{self, BoardConfig};
use crate::dashboard::{DashboardController, FetchOutcome};
use crate::facets::{FacetSet, PEST_OPTIONS, SWOT_OPTIONS};
use crate::filter::FilterCriteria;
use crate::model::Record;
use crate::source::{self, DataSource, FileSource, HttpSource};
use crate::web;

/// Output format for data commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

/// Data selection flags shared by `records`, `facets` and `chart`.
#[derive(Debug, Clone, Default, Args)]
pub struct DataArgs {
    /// Read records from a local JSON file instead of the API
    #[arg(long)]
    pub input: Option<PathBuf>,
    /// Case-insensitive title search
    #[arg(long)]
    pub search: Option<String>,
    /// Earliest published date (e.g. 2020-06-01)
    #[arg(long = "from")]
    pub date_from: Option<String>,
    /// Latest published date
    #[arg(long = "to")]
    pub date_to: Option<String>,
    /// Exact end year
    #[arg(long)]
    pub end_year: Option<String>,
    /// Topic to match; repeat for several (any may match)
    #[arg(long = "topic")]
    pub topics: Vec<String>,
    #[arg(long)]
    pub sector: Option<String>,
    #[arg(long)]
    pub region: Option<String>,
    /// PEST category (Political, Economic, Social, Technological)
    #[arg(long)]
    pub pest: Option<String>,
    /// Case-insensitive substring of the record source
    #[arg(long)]
    pub source: Option<String>,
    /// SWOT category (Strengths, Weaknesses, Opportunities, Threats)
    #[arg(long)]
    pub swot: Option<String>,
    #[arg(long)]
    pub country: Option<String>,
    #[arg(long)]
    pub city: Option<String>,
    /// Send exact-match filters to the API as query parameters
    #[arg(long)]
    pub server_side: bool,
}

impl DataArgs {
    /// Filter criteria described by the flags.
    pub fn criteria(&self) -> FilterCriteria {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        FilterCriteria {
            search: text(&self.search),
            date_from: text(&self.date_from),
            date_to: text(&self.date_to),
            end_year: text(&self.end_year),
            topics: self.topics.clone(),
            sector: text(&self.sector),
            region: text(&self.region),
            pest: text(&self.pest),
            source: text(&self.source),
            swot: text(&self.swot),
            country: text(&self.country),
            city: text(&self.city),
            sort_by: String::new(),
        }
    }
}

/// Configuration management subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write a default config to ~/.insightboard/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a value, e.g. `source.base_url http://host:5000`
    Set { key: String, value: String },
    /// Reset the global config to defaults
    Reset,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Build a controller, apply the criteria and fetch once.
///
/// For one-shot commands a failed fetch leaves nothing to show, so it is
/// returned as an error after being logged.
/// Fetch records and apply the criteria. `pushdown` allows narrowing the
/// fetch on the server; callers that need the full record set pass `false`.
fn load_board(data: &DataArgs, cfg: &BoardConfig, pushdown: bool) -> Result<DashboardController> {
    let criteria = data.criteria();
    let data_source: Box<dyn DataSource> = match &data.input {
        Some(path) => Box::new(FileSource::new(path)),
        None => {
            let mut http = HttpSource::from_config(&cfg.source);
            if pushdown && (data.server_side || cfg.source.server_side_filters) {
                http = http.with_query(source::remote_query(&criteria));
            }
            Box::new(http)
        }
    };

    let mut board = DashboardController::new(cfg.chart.clone());
    board.set_criteria(criteria);

    let outcome = board.refresh(data_source.as_ref());
    logger::log_fetch(&cfg.logging, &data_source.describe(), &outcome);

    match outcome {
        FetchOutcome::Loaded { skipped, .. } => {
            if skipped > 0 {
                eprintln!(
                    "{}",
                    format!("warning: skipped {skipped} undecodable records").yellow()
                );
            }
            Ok(board)
        }
        FetchOutcome::Failed { error, .. } => {
            anyhow::bail!("could not load records from {}: {error}", data_source.describe())
        }
        FetchOutcome::Stale => Ok(board),
    }
}

// ---------------------------------------------------------------------------
// insightboard serve
// ---------------------------------------------------------------------------

/// Start the dashboard server.
pub fn run_serve(addr: Option<String>, no_browser: bool) -> Result<()> {
    let mut cfg = config::load();
    if let Some(addr) = addr {
        cfg.web.addr = addr;
    }
    if no_browser {
        cfg.web.open_browser = false;
    }
    web::serve(cfg)
}

// ---------------------------------------------------------------------------
// insightboard records
// ---------------------------------------------------------------------------

/// Print the records matching the filters.
pub fn run_records(data: &DataArgs, format: OutputFormat, limit: Option<usize>) -> Result<()> {
    let cfg = config::load();
    let board = load_board(data, &cfg, true)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(board.filtered())?),
        OutputFormat::Csv => print!("{}", records_csv(board.filtered())),
        OutputFormat::Table if board.filtered().is_empty() => {
            println!("{}", "No records match the current filters.".yellow());
        }
        OutputFormat::Table => {
            let shown = board.preview(limit.unwrap_or(usize::MAX));
            print_records_table(shown, board.filtered().len(), board.records().len());
        }
    }

    Ok(())
}

fn print_records_table(records: &[Record], matched: usize, total: usize) {
    println!(
        "{}",
        format!("Insights: {matched} of {total} records").bold().cyan()
    );
    println!("{}", "=".repeat(96));
    println!(
        "  {:<40} {:<16} {:<16} {:>4} {:<12}",
        "Title", "Region", "Sector", "Int", "Published"
    );
    println!("  {}", "-".repeat(94));

    for (i, r) in records.iter().enumerate() {
        let published = r
            .published_at()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        let line = format!(
            "  {:<40} {:<16} {:<16} {:>4} {:<12}",
            truncate(&r.title, 40),
            truncate(r.region.as_deref().unwrap_or("-"), 16),
            truncate(r.sector.as_deref().unwrap_or("-"), 16),
            r.intensity.map_or_else(|| "-".to_string(), |v| v.to_string()),
            published,
        );
        if i % 2 == 0 {
            println!("{line}");
        } else {
            println!("{}", line.dimmed());
        }
    }

    if records.len() < matched {
        println!();
        println!(
            "  {}",
            format!("… {} more (use --limit or --format json)", matched - records.len()).dimmed()
        );
    }
}

/// Records as CSV. The header line is always present.
fn records_csv(records: &[Record]) -> String {
    let mut out = String::from(
        "title,topic,sector,region,country,pestle,swot,source,intensity,relevance,likelihood,end_year,published\n",
    );
    for r in records {
        let num = |v: Option<i64>| v.map(|n| n.to_string()).unwrap_or_default();
        let text = |v: &Option<String>| csv_field(v.as_deref().unwrap_or(""));
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{},{},{}\n",
            csv_field(&r.title),
            csv_field(&r.topic.join(";")),
            text(&r.sector),
            text(&r.region),
            text(&r.country),
            text(&r.pestle),
            text(&r.swot),
            text(&r.source),
            num(r.intensity),
            num(r.relevance),
            num(r.likelihood),
            num(r.end_year),
            text(&r.published),
        ));
    }
    out
}

// ---------------------------------------------------------------------------
// insightboard facets
// ---------------------------------------------------------------------------

/// Print the distinct values available for each filter.
pub fn run_facets(data: &DataArgs, format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let board = load_board(data, &cfg, false)?;
    let facets = board.facets();

    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "facets": facets,
                "pest_options": PEST_OPTIONS,
                "swot_options": SWOT_OPTIONS,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Csv => {
            println!("facet,value");
            for (name, values) in facet_columns(facets) {
                for v in values {
                    println!("{},{}", name, csv_field(&v));
                }
            }
        }
        OutputFormat::Table => {
            println!("{}", "Filter Facets".bold().cyan());
            println!("{}", "=".repeat(60));
            for (name, values) in facet_columns(facets) {
                println!("  {} ({})", name.bold(), values.len());
                if !values.is_empty() {
                    println!("    {}", truncate(&values.join(", "), 72).dimmed());
                }
            }
        }
    }

    Ok(())
}

fn facet_columns(facets: &FacetSet) -> Vec<(&'static str, Vec<String>)> {
    vec![
        ("topics", facets.topics.clone()),
        ("sectors", facets.sectors.clone()),
        ("regions", facets.regions.clone()),
        ("countries", facets.countries.clone()),
        ("cities", facets.cities.clone()),
        ("sources", facets.sources.clone()),
        ("pestles", facets.pestles.clone()),
        ("swots", facets.swots.clone()),
        (
            "end_years",
            facets.end_years.iter().map(|y| y.to_string()).collect(),
        ),
    ]
}

// ---------------------------------------------------------------------------
// insightboard chart
// ---------------------------------------------------------------------------

/// Build and print a chart spec for the filtered records.
pub fn run_chart(chart_type: Option<&str>, data: &DataArgs, format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let chart_type = match chart_type {
        Some(name) => match ChartType::from_str_opt(name) {
            Some(t) => t,
            None => {
                let known: Vec<&str> = ChartType::ALL.iter().map(|t| t.as_str()).collect();
                anyhow::bail!(
                    "unknown chart type '{name}' (expected one of: {})",
                    known.join(", ")
                );
            }
        },
        None => cfg.chart.default_type,
    };

    let board = load_board(data, &cfg, true)?;
    let spec = chart::build_with(board.filtered(), chart_type, &cfg.chart);

    match format {
        OutputFormat::Json | OutputFormat::Csv => {
            println!("{}", serde_json::to_string_pretty(&spec)?)
        }
        OutputFormat::Table => print_chart_summary(&spec),
    }

    Ok(())
}

fn print_chart_summary(spec: &ChartSpec) {
    let kind = spec
        .chart_type
        .map(|t| t.to_string())
        .unwrap_or_else(|| "none".to_string());
    println!("{}", format!("{} [{kind}]", spec.title).bold().cyan());
    println!("{}", "=".repeat(60));
    println!("  {} {}", "X axis:".bold(), spec.x_label);
    println!("  {} {}", "Y axis:".bold(), spec.y_label);
    println!(
        "  {} {}×{}",
        "Size:  ".bold(),
        spec.layout.width,
        spec.layout.height
    );
    println!("  {} {}", "Marks: ".bold(), spec.mark_count());
    println!();

    for label in mark_labels(&spec.marks).iter().take(20) {
        println!("  {} {}", "·".dimmed(), label);
    }
    if spec.mark_count() > 20 {
        println!("  {}", format!("… {} more", spec.mark_count() - 20).dimmed());
    }
}

fn mark_labels(marks: &Marks) -> Vec<String> {
    match marks {
        Marks::Empty => Vec::new(),
        Marks::Bars { bars, .. } => bars.iter().map(|b| b.label.clone()).collect(),
        Marks::Line { points, .. }
        | Marks::Scatter { points, .. }
        | Marks::Timeline { points, .. } => points.iter().map(|p| p.label.clone()).collect(),
        Marks::Bubbles { bubbles, .. } => bubbles.iter().map(|p| p.label.clone()).collect(),
        Marks::Pie { arcs, .. } => arcs.iter().map(|a| a.label.clone()).collect(),
        Marks::Heatmap { cells, .. } => cells.iter().map(|c| c.label.clone()).collect(),
    }
}

// ---------------------------------------------------------------------------
// insightboard health
// ---------------------------------------------------------------------------

/// Check data source, config files and fetch log.
pub fn run_health() -> Result<()> {
    println!("{}", "insightboard Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let cfg = config::load();
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.insightboard/config.toml found"
        } else {
            "not found (run `insightboard config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".insightboard.toml found"
        } else {
            "none (optional)"
        },
    );

    let http = HttpSource::from_config(&cfg.source);
    let reachable = http.is_reachable();
    print_health_item(
        "Data API",
        reachable,
        &if reachable {
            format!("reachable at {}", http.url())
        } else {
            format!("not reachable at {}", http.url())
        },
    );

    let log_exists = logger::log_path(&cfg.logging)
        .map(|p| p.exists())
        .unwrap_or(false);
    print_health_item(
        "Fetch log",
        log_exists || !cfg.logging.enabled,
        &if !cfg.logging.enabled {
            "disabled".to_string()
        } else if log_exists {
            format!("{} entries", logger::read_all_entries(&cfg.logging).len())
        } else {
            "no log file yet".to_string()
        },
    );

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<20} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// insightboard history
// ---------------------------------------------------------------------------

/// Summarize the fetch activity log.
pub fn run_history(last: usize, format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let entries = logger::read_all_entries(&cfg.logging);

    if entries.is_empty() {
        println!("{}", "No fetches logged yet.".yellow());
        return Ok(());
    }

    let summary = reporter::summarize(&entries);
    let recent = reporter::recent(&entries, last);

    if format == OutputFormat::Json {
        let value = serde_json::json!({
            "total": summary.total,
            "loaded": summary.loaded,
            "failed": summary.failed,
            "stale": summary.stale,
            "avg_latency_ms": summary.avg_latency_ms,
            "last_success": summary.last_success,
            "last_error": summary.last_error,
            "recent": recent,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", "Fetch History".bold().cyan());
    println!("{}", "=".repeat(60));
    println!("  {} {}", "Fetches:    ".bold(), summary.total);
    println!(
        "  {} {} ({:.0}%)",
        "Failures:   ".bold(),
        summary.failed,
        summary.failure_pct()
    );
    println!("  {} {:.0}ms", "Avg latency:".bold(), summary.avg_latency_ms);
    if let Some(ts) = &summary.last_success {
        println!("  {} {}", "Last OK:    ".bold(), ts);
    }
    if let Some(err) = &summary.last_error {
        println!("  {} {}", "Last error: ".bold(), err.red());
    }
    println!();

    for entry in recent {
        let outcome = match entry.outcome.as_str() {
            "loaded" => entry.outcome.green(),
            "failed" => entry.outcome.red(),
            _ => entry.outcome.yellow(),
        };
        println!(
            "  {:<26} {:<8} {:>6} {:>7}ms {}",
            truncate(&entry.timestamp, 26),
            outcome,
            entry.records,
            entry.latency_ms,
            truncate(&entry.source, 40).dimmed(),
        );
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// insightboard config show | init | set | reset
// ---------------------------------------------------------------------------

/// Dispatch a `config` subcommand.
pub fn run_config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => run_config_show(),
        ConfigAction::Init { force } => {
            let path = config::init_config(force)?;
            println!("{} Config written to {}", "✓".green().bold(), path.display());
            Ok(())
        }
        ConfigAction::Set { key, value } => {
            config::set_config_value(&key, &value)?;
            println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
            Ok(())
        }
        ConfigAction::Reset => {
            let path = config::reset_config()?;
            println!(
                "{} Config reset to defaults at {}",
                "✓".green().bold(),
                path.display()
            );
            Ok(())
        }
    }
}

fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    for (label, path) in [
        ("~/.insightboard/config.toml", config::global_config_file()),
        (".insightboard.toml", config::project_config_file()),
    ] {
        if path.is_some_and(|p| p.exists()) {
            println!("  {} {}", "✓".green(), label.dimmed());
        } else {
            println!("  {} {}", "·".dimmed(), format!("{label} (not found)").dimmed());
        }
    }
    println!(
        "  {} {}",
        "·".dimmed(),
        "INSIGHTBOARD_* environment variables".dimmed()
    );

    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Truncate to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

/// Quote a CSV field when it contains a delimiter, quote or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

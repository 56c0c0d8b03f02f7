use anyhow::Result;
use clap::{Parser, Subcommand};

use insightboard::cli::{self, ConfigAction, DataArgs, OutputFormat};

#[derive(Debug, Parser)]
#[command(name = "insightboard")]
#[command(about = "Filter insight records and build chart specifications")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Serve the interactive dashboard over HTTP
    Serve {
        /// Listen address (default from config: 127.0.0.1:9750)
        #[arg(long)]
        addr: Option<String>,
        /// Do not open a browser window
        #[arg(long)]
        no_browser: bool,
    },
    /// List the records that match the given filters
    Records {
        #[command(flatten)]
        data: DataArgs,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
        /// Show at most N records (table format only)
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List the distinct values available for each filter
    Facets {
        #[command(flatten)]
        data: DataArgs,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Build a chart specification for the filtered records
    Chart {
        /// Chart type: bar, line, pie, bubble, scatter, heatmap, timeline
        #[arg(long = "type", short = 't')]
        chart_type: Option<String>,
        #[command(flatten)]
        data: DataArgs,
        /// Output format: table (summary, default) or json (full spec)
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Check data source reachability and config/log files
    Health,
    /// Summarize recent fetch activity
    History {
        /// Number of recent fetches to list
        #[arg(long, default_value = "10")]
        last: usize,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show or edit configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Serve { addr, no_browser } => cli::run_serve(addr, no_browser),
        Commands::Records {
            data,
            format,
            limit,
        } => cli::run_records(&data, OutputFormat::from_str_opt(Some(&format)), limit),
        Commands::Facets { data, format } => {
            cli::run_facets(&data, OutputFormat::from_str_opt(Some(&format)))
        }
        Commands::Chart {
            chart_type,
            data,
            format,
        } => cli::run_chart(
            chart_type.as_deref(),
            &data,
            OutputFormat::from_str_opt(Some(&format)),
        ),
        Commands::Health => cli::run_health(),
        Commands::History { last, format } => {
            cli::run_history(last, OutputFormat::from_str_opt(Some(&format)))
        }
        Commands::Config { action } => cli::run_config(action),
    }
}

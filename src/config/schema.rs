/// Configuration schema and defaults for insightboard.
///
/// Defines the TOML-serializable configuration structure with all sections:
/// `[source]`, `[web]`, `[chart]`, and `[logging]`.
///
/// Every field has a built-in default. Users only need to set the values
/// they want to override.
use serde::{Deserialize, Serialize};

use crate::chart::ChartType;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level insightboard configuration.
///
/// Maps directly to the `~/.insightboard/config.toml` and
/// `.insightboard.toml` file schemas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub source: SourceConfig,
    pub web: WebConfig,
    pub chart: ChartConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [source]
// ---------------------------------------------------------------------------

/// Where insight records are fetched from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Base URL of the data API (no trailing path).
    pub base_url: String,
    /// Path of the records endpoint, appended to `base_url`.
    pub data_path: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Push exact-match criteria down to the API as query parameters.
    pub server_side_filters: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            data_path: "/api/data".to_string(),
            timeout_ms: 10_000,
            server_side_filters: false,
        }
    }
}

// ---------------------------------------------------------------------------
// [web]
// ---------------------------------------------------------------------------

/// Embedded dashboard server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Listen address for `insightboard serve`.
    pub addr: String,
    /// Open the dashboard in the default browser on start.
    pub open_browser: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:9750".to_string(),
            open_browser: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [chart]
// ---------------------------------------------------------------------------

/// Chart layout and styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Chart type selected when the dashboard starts.
    pub default_type: ChartType,
    pub width: f64,
    pub height: f64,
    pub margin_top: f64,
    pub margin_right: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    /// Inner and outer padding of band scales, as a fraction of the step.
    pub band_padding: f64,
    /// Constant radius of bubble-chart marks.
    pub bubble_radius: f64,
    /// Radius of scatter and timeline points.
    pub point_radius: f64,
    /// Heatmap color for the lowest intensity.
    pub color_low: String,
    /// Heatmap color for the highest intensity.
    pub color_high: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            default_type: ChartType::Bar,
            width: 600.0,
            height: 400.0,
            margin_top: 20.0,
            margin_right: 30.0,
            margin_bottom: 60.0,
            margin_left: 60.0,
            band_padding: 0.1,
            bubble_radius: 10.0,
            point_radius: 5.0,
            color_low: "#ffffcc".to_string(),
            color_high: "#800026".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Fetch activity log settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    /// JSONL log path; a leading `~` expands to the home directory.
    pub path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.insightboard/fetch-log.jsonl".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default TOML content
// ---------------------------------------------------------------------------

impl BoardConfig {
    /// Generate the annotated default TOML config file content.
    ///
    /// Used by `insightboard config init`.
    pub fn default_toml() -> String {
        r##"# insightboard configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (INSIGHTBOARD_*)
#   2. Project config (.insightboard.toml in current directory)
#   3. User global config (~/.insightboard/config.toml)
#   4. Built-in defaults

[source]
base_url = "http://localhost:5000"
data_path = "/api/data"
timeout_ms = 10000
server_side_filters = false   # Send exact-match filters as query parameters

[web]
addr = "127.0.0.1:9750"
open_browser = true

[chart]
default_type = "bar"          # bar | line | pie | bubble | scatter | heatmap | timeline
width = 600.0
height = 400.0
margin_top = 20.0
margin_right = 30.0
margin_bottom = 60.0
margin_left = 60.0
band_padding = 0.1
bubble_radius = 10.0
point_radius = 5.0
color_low = "#ffffcc"
color_high = "#800026"

[logging]
enabled = true
path = "~/.insightboard/fetch-log.jsonl"
"##
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

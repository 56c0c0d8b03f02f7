//! Chart adapter: maps filtered records to a backend-agnostic chart spec.
//!
//! [`build`] turns a record slice and a [`ChartType`] into a [`ChartSpec`]:
//! scales, per-datum geometry, axis labels, and a title. Coordinates are
//! relative to the inner plotting area (the layout margins are already
//! subtracted), with `y = 0` at the top.
//!
//! Records that lack the field a chart type plots (e.g. no `intensity`)
//! are left out of that chart. Nothing here can fail: an unrecognized chart
//! type name gives [`Marks::Empty`].

mod build;
pub mod scale;

use serde::{Deserialize, Serialize};

use crate::config::schema::ChartConfig;
use crate::model::Record;

use self::scale::{BandScale, ColorScale, LinearScale, TimeScale};

// ---------------------------------------------------------------------------
// Chart type
// ---------------------------------------------------------------------------

/// The closed set of supported chart types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Bar,
    Line,
    Pie,
    Bubble,
    Scatter,
    Heatmap,
    Timeline,
}

impl ChartType {
    pub const ALL: [ChartType; 7] = [
        Self::Bar,
        Self::Line,
        Self::Pie,
        Self::Bubble,
        Self::Scatter,
        Self::Heatmap,
        Self::Timeline,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Line => "line",
            Self::Pie => "pie",
            Self::Bubble => "bubble",
            Self::Scatter => "scatter",
            Self::Heatmap => "heatmap",
            Self::Timeline => "timeline",
        }
    }

    /// Parse a chart type name (case-insensitive). Unknown names give `None`.
    pub fn from_str_opt(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Bar => "Intensity of Insights by Title",
            Self::Line => "Intensity Trend by Title",
            Self::Pie => "Insights by Region",
            Self::Bubble => "Intensity Bubbles",
            Self::Scatter => "Intensity by Topic",
            Self::Heatmap => "Intensity by Region and Sector",
            Self::Timeline => "Intensity over Time",
        }
    }

    pub fn x_label(self) -> &'static str {
        match self {
            Self::Bar | Self::Line => "Insight Title",
            Self::Pie | Self::Heatmap => "Region",
            Self::Bubble => "Intensity",
            Self::Scatter => "Topic",
            Self::Timeline => "Published",
        }
    }

    pub fn y_label(self) -> &'static str {
        match self {
            Self::Pie => "Count",
            Self::Heatmap => "Sector",
            _ => "Intensity",
        }
    }
}

impl std::fmt::Display for ChartType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Spec types
// ---------------------------------------------------------------------------

/// Outer size and margins of a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub width: f64,
    pub height: f64,
    pub margin_top: f64,
    pub margin_right: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
}

impl Layout {
    pub fn from_config(config: &ChartConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            margin_top: config.margin_top,
            margin_right: config.margin_right,
            margin_bottom: config.margin_bottom,
            margin_left: config.margin_left,
        }
    }

    pub fn inner_width(&self) -> f64 {
        (self.width - self.margin_left - self.margin_right).max(0.0)
    }

    pub fn inner_height(&self) -> f64 {
        (self.height - self.margin_top - self.margin_bottom).max(0.0)
    }
}

/// A built chart, ready for a rendering backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    /// `None` when the requested chart type was not recognized.
    pub chart_type: Option<ChartType>,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub layout: Layout,
    pub marks: Marks,
}

impl ChartSpec {
    /// A spec that draws nothing.
    pub fn empty(layout: Layout) -> Self {
        Self {
            chart_type: None,
            title: String::new(),
            x_label: String::new(),
            y_label: String::new(),
            layout,
            marks: Marks::Empty,
        }
    }

    /// Number of drawn marks (bars, points, arcs, cells).
    pub fn mark_count(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mark_count() == 0
    }
}

/// Type-specific geometry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Marks {
    Empty,
    Bars {
        x: BandScale,
        y: LinearScale,
        bars: Vec<Bar>,
    },
    Line {
        x: BandScale,
        y: LinearScale,
        /// Connected in order.
        points: Vec<Point>,
    },
    Pie {
        center: (f64, f64),
        radius: f64,
        total: usize,
        arcs: Vec<Arc>,
    },
    Bubbles {
        x: LinearScale,
        y: LinearScale,
        radius: f64,
        bubbles: Vec<Point>,
    },
    Scatter {
        x: BandScale,
        y: LinearScale,
        radius: f64,
        points: Vec<Point>,
    },
    Heatmap {
        x: BandScale,
        y: BandScale,
        color: ColorScale,
        cells: Vec<Cell>,
    },
    Timeline {
        x: TimeScale,
        y: LinearScale,
        radius: f64,
        points: Vec<Point>,
    },
}

impl Marks {
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Bars { bars, .. } => bars.len(),
            Self::Line { points, .. }
            | Self::Scatter { points, .. }
            | Self::Timeline { points, .. } => points.len(),
            Self::Bubbles { bubbles, .. } => bubbles.len(),
            Self::Pie { arcs, .. } => arcs.len(),
            Self::Heatmap { cells, .. } => cells.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One bar: top-left corner plus size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub key: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub value: i64,
    pub label: String,
}

/// A point mark (line vertex, bubble, scatter or timeline point).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub key: String,
    pub x: f64,
    pub y: f64,
    pub value: i64,
    pub label: String,
}

/// A pie slice. Angles are radians, clockwise from 12 o'clock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Arc {
    pub key: String,
    pub count: usize,
    pub start_angle: f64,
    pub end_angle: f64,
    pub label: String,
}

/// A heatmap cell keyed by (region, sector).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub x_key: String,
    pub y_key: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub value: i64,
    pub color: String,
    pub label: String,
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Build a chart with the default layout.
pub fn build(records: &[Record], chart_type: ChartType) -> ChartSpec {
    build_with(records, chart_type, &ChartConfig::default())
}

/// Build a chart with an explicit layout/styling config.
pub fn build_with(records: &[Record], chart_type: ChartType, config: &ChartConfig) -> ChartSpec {
    let layout = Layout::from_config(config);
    let marks = match chart_type {
        ChartType::Bar => build::bars(records, &layout, config),
        ChartType::Line => build::line(records, &layout, config),
        ChartType::Pie => build::pie(records, &layout),
        ChartType::Bubble => build::bubbles(records, &layout, config),
        ChartType::Scatter => build::scatter(records, &layout, config),
        ChartType::Heatmap => build::heatmap(records, &layout, config),
        ChartType::Timeline => build::timeline(records, &layout, config),
    };
    ChartSpec {
        chart_type: Some(chart_type),
        title: chart_type.title().to_string(),
        x_label: chart_type.x_label().to_string(),
        y_label: chart_type.y_label().to_string(),
        layout,
        marks,
    }
}

/// Build a chart from a type name; unknown names give an empty spec.
pub fn build_named(records: &[Record], name: &str, config: &ChartConfig) -> ChartSpec {
    match ChartType::from_str_opt(name) {
        Some(chart_type) => build_with(records, chart_type, config),
        None => ChartSpec::empty(Layout::from_config(config)),
    }
}

// ---------------------------------------------------------------------------
// Tooltips
// ---------------------------------------------------------------------------

/// Hover text for one record: its primary category field and measure.
pub fn tooltip_label(record: &Record, chart_type: ChartType) -> String {
    let intensity = display_measure(record.intensity);
    match chart_type {
        ChartType::Bar | ChartType::Line | ChartType::Bubble | ChartType::Timeline => {
            format!("Title: {} | Intensity: {intensity}", record.title)
        }
        ChartType::Scatter => format!(
            "Topic: {} | Intensity: {intensity}",
            record.topic.first().map(String::as_str).unwrap_or("n/a")
        ),
        ChartType::Pie => format!(
            "Region: {} | Intensity: {intensity}",
            record.region.as_deref().unwrap_or("n/a")
        ),
        ChartType::Heatmap => format!(
            "Region: {} | Sector: {} | Intensity: {intensity}",
            record.region.as_deref().unwrap_or("n/a"),
            record.sector.as_deref().unwrap_or("n/a")
        ),
    }
}

fn display_measure(value: Option<i64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| v.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_type_round_trips_names() {
        for t in ChartType::ALL {
            assert_eq!(ChartType::from_str_opt(t.as_str()), Some(t));
        }
        assert_eq!(ChartType::from_str_opt(" PIE "), Some(ChartType::Pie));
        assert_eq!(ChartType::from_str_opt("radar"), None);
    }

    #[test]
    fn unknown_name_gives_empty_spec() {
        let spec = build_named(&[Record::titled("a")], "radar", &ChartConfig::default());
        assert_eq!(spec.chart_type, None);
        assert_eq!(spec.marks, Marks::Empty);
        assert!(spec.is_empty());
    }

    #[test]
    fn every_type_has_static_text() {
        for t in ChartType::ALL {
            let spec = build(&[], t);
            assert!(!spec.title.is_empty());
            assert!(!spec.x_label.is_empty());
            assert!(!spec.y_label.is_empty());
            assert!(spec.is_empty());
        }
    }

    #[test]
    fn layout_inner_size() {
        let layout = Layout::from_config(&ChartConfig::default());
        assert_eq!(layout.inner_width(), 510.0);
        assert_eq!(layout.inner_height(), 320.0);
    }

    #[test]
    fn tooltip_combines_category_and_measure() {
        let r = Record {
            intensity: Some(8),
            region: Some("Asia".to_string()),
            sector: Some("Energy".to_string()),
            ..Record::titled("B")
        };
        assert_eq!(tooltip_label(&r, ChartType::Bar), "Title: B | Intensity: 8");
        assert_eq!(
            tooltip_label(&r, ChartType::Heatmap),
            "Region: Asia | Sector: Energy | Intensity: 8"
        );
        assert_eq!(
            tooltip_label(&Record::titled("x"), ChartType::Scatter),
            "Topic: n/a | Intensity: n/a"
        );
    }

    #[test]
    fn spec_serializes_with_kind_tag() {
        let spec = build(&[], ChartType::Pie);
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["chart_type"], "pie");
        assert_eq!(json["marks"]["kind"], "pie");
    }
}

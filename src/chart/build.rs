//! Per-chart-type geometry builders.

use std::collections::HashMap;
use std::f64::consts::TAU;

use crate::config::schema::ChartConfig;
use crate::facets::distinct;
use crate::model::Record;

use super::scale::{BandScale, ColorScale, LinearScale, TimeScale};
use super::{Arc, Bar, Cell, ChartType, Layout, Marks, Point, tooltip_label};

/// Records that carry an intensity, paired with it.
fn measured(records: &[Record]) -> Vec<(&Record, i64)> {
    records
        .iter()
        .filter_map(|r| r.intensity.map(|v| (r, v)))
        .collect()
}

fn max_value<'a>(values: impl IntoIterator<Item = &'a i64>) -> f64 {
    values
        .into_iter()
        .map(|v| *v as f64)
        .fold(f64::NEG_INFINITY, f64::max)
}

/// Band x-scale over titles plus zero-based y-scale over intensity.
fn title_scales(
    rows: &[(&Record, i64)],
    layout: &Layout,
    config: &ChartConfig,
) -> (BandScale, LinearScale) {
    let titles = distinct(rows.iter().map(|(r, _)| r.title.as_str()));
    let x = BandScale::new(titles, (0.0, layout.inner_width()), config.band_padding);
    let y = LinearScale::zero_based(
        max_value(rows.iter().map(|(_, v)| v)),
        (layout.inner_height(), 0.0),
    );
    (x, y)
}

// ---------------------------------------------------------------------------
// bar / line
// ---------------------------------------------------------------------------

pub(super) fn bars(records: &[Record], layout: &Layout, config: &ChartConfig) -> Marks {
    let rows = measured(records);
    let (x, y) = title_scales(&rows, layout, config);
    let bottom = layout.inner_height();

    let bars = rows
        .iter()
        .filter_map(|(r, v)| {
            let left = x.position(&r.title)?;
            let top = y.map(*v as f64);
            Some(Bar {
                key: r.title.clone(),
                x: left,
                y: top,
                width: x.bandwidth,
                height: bottom - top,
                value: *v,
                label: tooltip_label(r, ChartType::Bar),
            })
        })
        .collect();

    Marks::Bars { x, y, bars }
}

pub(super) fn line(records: &[Record], layout: &Layout, config: &ChartConfig) -> Marks {
    let rows = measured(records);
    let (x, y) = title_scales(&rows, layout, config);

    let points = rows
        .iter()
        .filter_map(|(r, v)| {
            Some(Point {
                key: r.title.clone(),
                x: x.center(&r.title)?,
                y: y.map(*v as f64),
                value: *v,
                label: tooltip_label(r, ChartType::Line),
            })
        })
        .collect();

    Marks::Line { x, y, points }
}

// ---------------------------------------------------------------------------
// pie
// ---------------------------------------------------------------------------

/// One slice per region; the slice value is the record count, not a sum.
pub(super) fn pie(records: &[Record], layout: &Layout) -> Marks {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for region in records.iter().filter_map(|r| r.region.as_deref()) {
        match index.get(region) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(region, counts.len());
                counts.push((region.to_string(), 1));
            }
        }
    }

    let total: usize = counts.iter().map(|(_, c)| c).sum();
    let mut angle = 0.0;
    let arcs = counts
        .into_iter()
        .map(|(key, count)| {
            let sweep = TAU * count as f64 / total as f64;
            let arc = Arc {
                label: format!("Region: {key} | Count: {count}"),
                key,
                count,
                start_angle: angle,
                end_angle: angle + sweep,
            };
            angle += sweep;
            arc
        })
        .collect();

    let (w, h) = (layout.inner_width(), layout.inner_height());
    Marks::Pie {
        center: (w / 2.0, h / 2.0),
        radius: w.min(h) / 2.0,
        total,
        arcs,
    }
}

// ---------------------------------------------------------------------------
// bubble
// ---------------------------------------------------------------------------

/// Both axes plot intensity, so bubbles fall on the diagonal.
pub(super) fn bubbles(records: &[Record], layout: &Layout, config: &ChartConfig) -> Marks {
    let rows = measured(records);
    let max = max_value(rows.iter().map(|(_, v)| v));
    let x = LinearScale::zero_based(max, (0.0, layout.inner_width()));
    let y = LinearScale::zero_based(max, (layout.inner_height(), 0.0));

    let bubbles = rows
        .iter()
        .map(|(r, v)| Point {
            key: r.title.clone(),
            x: x.map(*v as f64),
            y: y.map(*v as f64),
            value: *v,
            label: tooltip_label(r, ChartType::Bubble),
        })
        .collect();

    Marks::Bubbles {
        x,
        y,
        radius: config.bubble_radius,
        bubbles,
    }
}

// ---------------------------------------------------------------------------
// scatter
// ---------------------------------------------------------------------------

/// One point per (record, topic) pair at the topic's band center.
pub(super) fn scatter(records: &[Record], layout: &Layout, config: &ChartConfig) -> Marks {
    let rows = measured(records);
    let topics = distinct(
        rows.iter()
            .flat_map(|(r, _)| r.topic.iter().map(String::as_str)),
    );
    let x = BandScale::new(topics, (0.0, layout.inner_width()), config.band_padding);
    let y = LinearScale::zero_based(
        max_value(rows.iter().filter(|(r, _)| !r.topic.is_empty()).map(|(_, v)| v)),
        (layout.inner_height(), 0.0),
    );

    let mut points = Vec::new();
    for (r, v) in &rows {
        for topic in &r.topic {
            let Some(cx) = x.center(topic) else {
                continue;
            };
            points.push(Point {
                key: topic.clone(),
                x: cx,
                y: y.map(*v as f64),
                value: *v,
                label: format!("Topic: {topic} | Intensity: {v}"),
            });
        }
    }

    Marks::Scatter {
        x,
        y,
        radius: config.point_radius,
        points,
    }
}

// ---------------------------------------------------------------------------
// heatmap
// ---------------------------------------------------------------------------

/// One cell per (region, sector) pair. Cells are not aggregated: a later
/// record for the same pair replaces the earlier one's value.
pub(super) fn heatmap(records: &[Record], layout: &Layout, config: &ChartConfig) -> Marks {
    let rows: Vec<(&Record, &str, &str, i64)> = records
        .iter()
        .filter_map(|r| Some((r, r.region.as_deref()?, r.sector.as_deref()?, r.intensity?)))
        .collect();

    let x = BandScale::new(
        distinct(rows.iter().map(|(_, region, _, _)| *region)),
        (0.0, layout.inner_width()),
        config.band_padding,
    );
    let y = BandScale::new(
        distinct(rows.iter().map(|(_, _, sector, _)| *sector)),
        (0.0, layout.inner_height()),
        config.band_padding,
    );
    let max = max_value(rows.iter().map(|(_, _, _, v)| v));
    let color = ColorScale::new(
        (0.0, if max.is_finite() && max > 0.0 { max } else { 1.0 }),
        &config.color_low,
        &config.color_high,
    );

    let mut cells: Vec<Cell> = Vec::new();
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();
    for (r, region, sector, v) in &rows {
        let (Some(cx), Some(cy)) = (x.position(region), y.position(sector)) else {
            continue;
        };
        let cell = Cell {
            x_key: region.to_string(),
            y_key: sector.to_string(),
            x: cx,
            y: cy,
            width: x.bandwidth,
            height: y.bandwidth,
            value: *v,
            color: color.color(*v as f64),
            label: tooltip_label(r, ChartType::Heatmap),
        };
        match index.get(&(*region, *sector)) {
            Some(&i) => cells[i] = cell,
            None => {
                index.insert((*region, *sector), cells.len());
                cells.push(cell);
            }
        }
    }

    Marks::Heatmap { x, y, color, cells }
}

// ---------------------------------------------------------------------------
// timeline
// ---------------------------------------------------------------------------

/// Unconnected points on a continuous time axis.
pub(super) fn timeline(records: &[Record], layout: &Layout, config: &ChartConfig) -> Marks {
    let rows: Vec<_> = records
        .iter()
        .filter_map(|r| Some((r, r.published_at()?, r.intensity?)))
        .collect();

    let (min, max) = rows
        .iter()
        .map(|(_, at, _)| *at)
        .fold(None, |acc, at| match acc {
            None => Some((at, at)),
            Some((lo, hi)) => Some((lo.min(at), hi.max(at))),
        })
        .unwrap_or_default();

    let x = TimeScale::new(min, max, (0.0, layout.inner_width()));
    let y = LinearScale::zero_based(
        max_value(rows.iter().map(|(_, _, v)| v)),
        (layout.inner_height(), 0.0),
    );

    let points = rows
        .iter()
        .map(|(r, at, v)| Point {
            key: r.title.clone(),
            x: x.map(*at),
            y: y.map(*v as f64),
            value: *v,
            label: tooltip_label(r, ChartType::Timeline),
        })
        .collect();

    Marks::Timeline {
        x,
        y,
        radius: config.point_radius,
        points,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

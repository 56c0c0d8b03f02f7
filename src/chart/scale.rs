/// Scales that map data values to plot coordinates.
///
/// Semantics follow the usual charting-library conventions: band scales
/// split a range into evenly spaced bands with inner/outer padding, linear
/// scales are zero-based with a "nice" upper bound, and the sequential color
/// scale interpolates between two hex colors.
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

/// Target number of ticks on linear axes.
const TICK_COUNT: f64 = 10.0;

/// Number of ticks on time axes.
const TIME_TICKS: usize = 5;

// ---------------------------------------------------------------------------
// Band scale
// ---------------------------------------------------------------------------

/// Categorical scale: one band per distinct domain value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandScale {
    pub domain: Vec<String>,
    pub range: (f64, f64),
    pub padding: f64,
    /// Distance between the starts of adjacent bands.
    pub step: f64,
    pub bandwidth: f64,
    /// Start of the first band.
    pub offset: f64,
}

impl BandScale {
    /// Build a band scale. `domain` must already be duplicate-free.
    pub fn new(domain: Vec<String>, range: (f64, f64), padding: f64) -> Self {
        let padding = padding.clamp(0.0, 1.0);
        let n = domain.len() as f64;
        let (r0, r1) = range;
        let step = (r1 - r0) / f64::max(1.0, n - padding + padding * 2.0);
        let offset = r0 + (r1 - r0 - step * (n - padding)) * 0.5;
        Self {
            domain,
            range,
            padding,
            step,
            bandwidth: step * (1.0 - padding),
            offset,
        }
    }

    /// Start coordinate of the band for `key`.
    pub fn position(&self, key: &str) -> Option<f64> {
        let index = self.domain.iter().position(|d| d == key)?;
        Some(self.offset + self.step * index as f64)
    }

    /// Center coordinate of the band for `key`.
    pub fn center(&self, key: &str) -> Option<f64> {
        self.position(key).map(|p| p + self.bandwidth / 2.0)
    }
}

// ---------------------------------------------------------------------------
// Linear scale
// ---------------------------------------------------------------------------

/// Continuous numeric scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
    pub ticks: Vec<f64>,
}

impl LinearScale {
    /// Scale over `[0, max]`, with `max` rounded up to a nice tick step.
    ///
    /// A non-positive or non-finite `max` (e.g. no data) yields `[0, 1]`.
    pub fn zero_based(max: f64, range: (f64, f64)) -> Self {
        let max = if max.is_finite() && max > 0.0 { max } else { 1.0 };
        let step = tick_step(0.0, max, TICK_COUNT);
        let count = (max / step).ceil();
        let nice_max = count * step;
        let ticks = (0..=count as usize).map(|i| i as f64 * step).collect();
        Self {
            domain: (0.0, nice_max),
            range,
            ticks,
        }
    }

    pub fn map(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d1 == d0 {
            return (r0 + r1) / 2.0;
        }
        r0 + (value - d0) / (d1 - d0) * (r1 - r0)
    }
}

/// Tick increment of 1, 2 or 5 times a power of ten, giving roughly
/// `count` ticks over `[start, stop]`.
fn tick_step(start: f64, stop: f64, count: f64) -> f64 {
    let raw = (stop - start).abs() / count;
    let power = 10f64.powf(raw.log10().floor());
    let error = raw / power;
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    power * factor
}

// ---------------------------------------------------------------------------
// Time scale
// ---------------------------------------------------------------------------

/// Continuous time scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeScale {
    pub domain: (NaiveDateTime, NaiveDateTime),
    pub range: (f64, f64),
    pub ticks: Vec<NaiveDateTime>,
}

impl TimeScale {
    /// Scale spanning `[min, max]`. A zero-width span is widened by one day
    /// on each side so single-instant data lands in the middle.
    pub fn new(min: NaiveDateTime, max: NaiveDateTime, range: (f64, f64)) -> Self {
        let (min, max) = if min < max {
            (min, max)
        } else {
            (min - Duration::days(1), min + Duration::days(1))
        };
        let span = (max - min).num_milliseconds();
        let ticks = (0..TIME_TICKS)
            .map(|i| min + Duration::milliseconds(span * i as i64 / (TIME_TICKS as i64 - 1)))
            .collect();
        Self {
            domain: (min, max),
            range,
            ticks,
        }
    }

    pub fn map(&self, value: NaiveDateTime) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = (d1 - d0).num_milliseconds() as f64;
        let offset = (value - d0).num_milliseconds() as f64;
        r0 + offset / span * (r1 - r0)
    }
}

// ---------------------------------------------------------------------------
// Sequential color scale
// ---------------------------------------------------------------------------

/// Interpolates linearly in RGB between `low` and `high` over `domain`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorScale {
    pub domain: (f64, f64),
    pub low: String,
    pub high: String,
}

impl ColorScale {
    pub fn new(domain: (f64, f64), low: &str, high: &str) -> Self {
        Self {
            domain,
            low: low.to_string(),
            high: high.to_string(),
        }
    }

    /// Hex color for `value`, clamped to the domain.
    ///
    /// Unparseable endpoint colors fall back to black/white so a bad config
    /// value never breaks a chart.
    pub fn color(&self, value: f64) -> String {
        let (d0, d1) = self.domain;
        let t = if d1 == d0 {
            1.0
        } else {
            ((value - d0) / (d1 - d0)).clamp(0.0, 1.0)
        };
        let low = parse_hex(&self.low).unwrap_or([255, 255, 255]);
        let high = parse_hex(&self.high).unwrap_or([0, 0, 0]);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        format!(
            "#{:02x}{:02x}{:02x}",
            mix(low[0], high[0]),
            mix(low[1], high[1]),
            mix(low[2], high[2])
        )
    }
}

fn parse_hex(color: &str) -> Option<[u8; 3]> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn band_scale_spacing() {
        let scale = BandScale::new(vec!["a".into(), "b".into()], (0.0, 210.0), 0.1);
        // step = 210 / (2 - 0.1 + 0.2) = 100
        assert!(approx(scale.step, 100.0));
        assert!(approx(scale.bandwidth, 90.0));
        assert!(approx(scale.position("a").unwrap(), 10.0));
        assert!(approx(scale.position("b").unwrap(), 110.0));
        assert!(approx(scale.center("b").unwrap(), 155.0));
        assert_eq!(scale.position("c"), None);
    }

    #[test]
    fn linear_scale_is_nice() {
        let scale = LinearScale::zero_based(8.0, (320.0, 0.0));
        assert!(approx(scale.domain.1, 8.0));
        assert!(approx(scale.map(8.0), 0.0));
        assert!(approx(scale.map(4.0), 160.0));
        assert_eq!(scale.ticks.len(), 9);

        let rounded = LinearScale::zero_based(47.0, (0.0, 100.0));
        assert!(approx(rounded.domain.1, 50.0));
    }

    #[test]
    fn linear_scale_without_data() {
        let scale = LinearScale::zero_based(f64::NEG_INFINITY, (0.0, 100.0));
        assert!(approx(scale.domain.1, 1.0));
    }

    #[test]
    fn time_scale_maps_endpoints() {
        let a = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let b = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let scale = TimeScale::new(a, b, (0.0, 500.0));
        assert!(approx(scale.map(a), 0.0));
        assert!(approx(scale.map(b), 500.0));
        assert_eq!(scale.ticks.len(), 5);
        assert_eq!(scale.ticks[4], b);
    }

    #[test]
    fn time_scale_widens_single_instant() {
        let a = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let scale = TimeScale::new(a, a, (0.0, 100.0));
        assert!(approx(scale.map(a), 50.0));
    }

    #[test]
    fn color_scale_interpolates() {
        let scale = ColorScale::new((0.0, 10.0), "#000000", "#ffffff");
        assert_eq!(scale.color(0.0), "#000000");
        assert_eq!(scale.color(10.0), "#ffffff");
        assert_eq!(scale.color(20.0), "#ffffff");
        assert_eq!(scale.color(5.0), "#808080");
    }

    #[test]
    fn color_scale_tolerates_bad_config() {
        let scale = ColorScale::new((0.0, 1.0), "nope", "#zzzzzz");
        assert_eq!(scale.color(0.0), "#ffffff");
    }
}

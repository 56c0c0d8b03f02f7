/// Timestamp parsing for record and filter date fields.
///
/// Everything is reduced to a naive instant. Offsets in RFC 3339 / RFC 2822
/// values are normalized to UTC; date-only values mean midnight.
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Date-time layouts tried after RFC 3339 and RFC 2822.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    // Upstream dataset: "January, 20 2017 03:51:25"
    "%B, %d %Y %H:%M:%S",
    "%B %d, %Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y", "%B, %d %Y"];

/// Parse a timestamp string. Returns `None` for empty or unrecognized input.
pub fn parse(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.naive_utc());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_date_only_as_midnight() {
        let dt = parse("2020-06-01").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2020, 6, 1));
        assert_eq!(dt.hour(), 0);
    }

    #[test]
    fn parses_rfc3339_to_utc() {
        let dt = parse("2020-06-01T10:00:00+02:00").unwrap();
        assert_eq!(dt.hour(), 8);
    }

    #[test]
    fn parses_rfc2822() {
        let dt = parse("Fri, 20 Jan 2017 03:51:25 GMT").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2017, 1, 20));
    }

    #[test]
    fn parses_dataset_format() {
        let dt = parse("January, 20 2017 03:51:25").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2017, 1, 20));
        assert_eq!(dt.minute(), 51);
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("   "), None);
        assert_eq!(parse("not a date"), None);
        assert_eq!(parse("2020-13-45"), None);
    }
}

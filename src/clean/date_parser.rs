// src/clean/date_parser.rs

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::load::clean_cell;

/// Parse a date or timestamp cell into its calendar date.
///
/// RFC 3339 is tried first (the date is taken in the timestamp's own offset),
/// then each of `formats` in order. The cell must start with a four-digit
/// year; two-digit years are never guessed.
pub fn parse_date(raw: &str, formats: &[String]) -> Option<NaiveDate> {
    let s = clean_cell(raw);
    if !has_four_digit_year(&s) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
        return Some(dt.date_naive());
    }

    for fmt in formats {
        if fmt.contains("%z") || fmt.contains("%:z") {
            if let Ok(dt) = DateTime::parse_from_str(&s, fmt) {
                return Some(dt.date_naive());
            }
            continue;
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(&s, fmt) {
            return Some(dt.date());
        }
        if let Ok(d) = NaiveDate::parse_from_str(&s, fmt) {
            return Some(d);
        }
    }
    None
}

fn has_four_digit_year(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 4
        && b[..4].iter().all(u8::is_ascii_digit)
        && b.get(4).map_or(true, |c| !c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;

    fn formats() -> Vec<String> {
        PipelineConfig::default().date_formats
    }

    #[test]
    fn parses_supported_shapes() {
        let f = formats();
        let d = |y, m, d| NaiveDate::from_ymd_opt(y, m, d);
        assert_eq!(parse_date("1850-01-01", &f), d(1850, 1, 1));
        assert_eq!(parse_date("\"2024-12-31\"", &f), d(2024, 12, 31));
        assert_eq!(parse_date("2019-06-30 23:15:00", &f), d(2019, 6, 30));
        assert_eq!(parse_date("2019/06/30", &f), d(2019, 6, 30));
        assert_eq!(parse_date("2020-01-01T00:00:00+00:00", &f), d(2020, 1, 1));
        assert_eq!(parse_date("2020-01-01T23:30:00-05:00", &f), d(2020, 1, 1));
        assert_eq!(parse_date("1743-11-01", &f), d(1743, 11, 1));
    }

    #[test]
    fn rejects_ambiguous_or_broken_dates() {
        let f = formats();
        assert_eq!(parse_date("24-01-01", &f), None);
        assert_eq!(parse_date("01/02/2020", &f), None);
        assert_eq!(parse_date("20201-01-01", &f), None);
        assert_eq!(parse_date("2020-13-01", &f), None);
        assert_eq!(parse_date("", &f), None);
        assert_eq!(parse_date("soon", &f), None);
    }
}

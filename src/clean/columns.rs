// src/clean/columns.rs

use regex::Regex;
use std::{collections::BTreeMap, sync::OnceLock};

use crate::load::RawRecord;

static NON_ALNUM: OnceLock<Regex> = OnceLock::new();

/// Canonical column name: trimmed, lowercase, every run of non-alphanumeric
/// characters collapsed to `_`, no leading/trailing `_`.
///
/// `"Last Updated"` → `last_updated`, `"PM2.5"` → `pm2_5`.
/// Applying it twice gives the same result as applying it once.
pub fn canonical_column(name: &str) -> String {
    let re = NON_ALNUM.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("valid column regex"));
    let lowered = name.trim().trim_start_matches('\u{feff}').to_lowercase();
    re.replace_all(&lowered, "_").trim_matches('_').to_string()
}

/// Canonical field name and the canonical header spellings that map to it,
/// most specific first.
pub type AliasTable = &'static [(&'static str, &'static [&'static str])];

pub const AIR_QUALITY_ALIASES: AliasTable = &[
    ("location", &["location", "location_name", "station", "site"]),
    ("city", &["city", "city_name"]),
    ("country", &["country", "country_label", "country_name", "country_code"]),
    ("parameter", &["parameter", "pollutant", "pollutant_name", "parameter_name"]),
    ("value", &["value", "concentration", "pm25", "pm2_5"]),
    ("unit", &["unit", "units"]),
    (
        "timestamp",
        &["timestamp", "last_updated", "date_utc", "datetime", "utc", "date", "date_local"],
    ),
];

pub const TEMPERATURE_ALIASES: AliasTable = &[
    ("date", &["date", "dt", "datetime", "timestamp"]),
    ("country", &["country", "country_name"]),
    ("city", &["city", "major_city", "city_name"]),
    (
        "temperature",
        &[
            "temperature",
            "averagetemperature",
            "landaveragetemperature",
            "meantemperature",
            "average_temperature",
            "avg_temperature",
        ],
    ),
];

/// Which source header feeds each canonical field, resolved once per table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    fields: BTreeMap<&'static str, String>,
}

impl ColumnMap {
    pub fn resolve(headers: &[String], aliases: AliasTable) -> Self {
        let canon: Vec<(String, &String)> =
            headers.iter().map(|h| (canonical_column(h), h)).collect();

        let mut fields = BTreeMap::new();
        for &(field, spellings) in aliases {
            let hit = spellings
                .iter()
                .find_map(|s| canon.iter().find(|(c, _)| c == s).map(|(_, h)| *h));
            if let Some(h) = hit {
                fields.insert(field, h.clone());
            }
        }
        Self { fields }
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn header(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// The field's cell in `row`, `None` when the column is absent or the cell
    /// is blank.
    pub fn get<'a>(&self, row: &'a RawRecord, field: &str) -> Option<&'a str> {
        let header = self.fields.get(field)?;
        row.get(header)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty() && !is_null_token(s))
    }
}

fn is_null_token(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "na" | "n/a" | "nan" | "null" | "none" | "-"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_names() {
        assert_eq!(canonical_column(" Last Updated "), "last_updated");
        assert_eq!(canonical_column("AverageTemperature"), "averagetemperature");
        assert_eq!(canonical_column("PM2.5"), "pm2_5");
        assert_eq!(canonical_column("Country Code"), "country_code");
        for name in ["Last Updated", "__x--y__", "dt"] {
            let once = canonical_column(name);
            assert_eq!(canonical_column(&once), once);
        }
    }

    #[test]
    fn resolve_prefers_earlier_alias() {
        let headers: Vec<String> = ["Country Code", "City", "Location", "Pollutant", "Value", "Last Updated", "Country Label"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let map = ColumnMap::resolve(&headers, AIR_QUALITY_ALIASES);
        assert_eq!(map.header("country"), Some("Country Label"));
        assert_eq!(map.header("parameter"), Some("Pollutant"));
        assert_eq!(map.header("timestamp"), Some("Last Updated"));
        assert!(!map.has("unit"));
    }

    #[test]
    fn blank_and_null_cells_read_as_missing() {
        let headers = vec!["AverageTemperature".to_string()];
        let map = ColumnMap::resolve(&headers, TEMPERATURE_ALIASES);
        let mut row = RawRecord::new();
        row.insert("AverageTemperature".into(), "NaN".into());
        assert_eq!(map.get(&row, "temperature"), None);
        row.insert("AverageTemperature".into(), " 4.2 ".into());
        assert_eq!(map.get(&row, "temperature"), Some("4.2"));
    }
}

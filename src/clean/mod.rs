// src/clean/mod.rs
pub mod columns;
pub mod date_parser;
pub mod features;
pub mod policy;
pub mod types;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, warn};

use crate::load::{RawRecord, RawTable};
use columns::{ColumnMap, AliasTable, AIR_QUALITY_ALIASES, TEMPERATURE_ALIASES};
pub use columns::canonical_column;
pub use features::{extract_time_features, Dated, TimeFields};
pub use policy::{parse_number, MissingPolicy};
pub use types::{AirQualityRow, NormalizedRow, TemperatureRow};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeStats {
    pub input_rows: usize,
    /// Rows excluded for a missing required field (or a missing number under `Drop`).
    pub dropped_missing: usize,
    /// Rows whose number was filled in by the policy.
    pub imputed: usize,
    /// Rows identical to an earlier source row in every column, mapped or
    /// not (first occurrence kept).
    pub duplicates: usize,
    pub output_rows: usize,
}

impl NormalizeStats {
    pub fn merge(&mut self, other: NormalizeStats) {
        self.input_rows += other.input_rows;
        self.dropped_missing += other.dropped_missing;
        self.imputed += other.imputed;
        self.duplicates += other.duplicates;
        self.output_rows += other.output_rows;
    }
}

/// Normalize an air-quality table.
///
/// Required: a location (the `location` column, else `city`), a parameter,
/// a timestamp cell, and a `value` handled by `policy`. The unit defaults to
/// empty.
#[tracing::instrument(level = "info", skip(table), fields(file = %table.source))]
pub fn normalize_air_quality(
    table: &RawTable,
    policy: MissingPolicy,
) -> (Vec<AirQualityRow>, NormalizeStats) {
    let map = ColumnMap::resolve(&table.headers, AIR_QUALITY_ALIASES);
    if !(map.has("location") || map.has("city")) {
        warn!(file = %table.source, "no location or city column");
    }

    normalize_rows(table, AIR_QUALITY_ALIASES, &map, "value", policy, |row, value| {
        let city = map.get(row, "city").map(str::to_string);
        let location = map
            .get(row, "location")
            .map(str::to_string)
            .or_else(|| city.clone())?;
        Some(AirQualityRow {
            location,
            city,
            country: map.get(row, "country").map(str::to_string),
            parameter: map.get(row, "parameter")?.to_string(),
            value,
            unit: map.get(row, "unit").unwrap_or_default().to_string(),
            timestamp: map.get(row, "timestamp")?.to_string(),
        })
    })
}

/// Normalize a temperature table. Required: a date cell and a `temperature`
/// handled by `policy`; country and city are optional.
#[tracing::instrument(level = "info", skip(table), fields(file = %table.source))]
pub fn normalize_temperature(
    table: &RawTable,
    policy: MissingPolicy,
) -> (Vec<TemperatureRow>, NormalizeStats) {
    let map = ColumnMap::resolve(&table.headers, TEMPERATURE_ALIASES);

    normalize_rows(table, TEMPERATURE_ALIASES, &map, "temperature", policy, |row, temperature| {
        Some(TemperatureRow {
            date: map.get(row, "date")?.to_string(),
            country: map.get(row, "country").map(str::to_string),
            city: map.get(row, "city").map(str::to_string),
            temperature,
        })
    })
}

fn normalize_rows<R, F>(
    table: &RawTable,
    aliases: AliasTable,
    map: &ColumnMap,
    numeric_field: &str,
    policy: MissingPolicy,
    mut build: F,
) -> (Vec<R>, NormalizeStats)
where
    R: NormalizedRow,
    F: FnMut(&RawRecord, f64) -> Option<R>,
{
    let mut stats = NormalizeStats {
        input_rows: table.rows.len(),
        ..Default::default()
    };

    let missing: Vec<&str> = aliases
        .iter()
        .map(|(field, _)| *field)
        .filter(|f| !map.has(f))
        .collect();
    if !missing.is_empty() {
        info!(file = %table.source, ?missing, "columns not present");
    }
    if !map.has(numeric_field) {
        warn!(file = %table.source, field = numeric_field, "numeric column not found; table yields no rows");
    }

    // 1) parse the numeric field once; the fill value comes from every parseable cell
    let parsed: Vec<Option<f64>> = table
        .rows
        .iter()
        .map(|row| map.get(row, numeric_field).and_then(parse_number))
        .collect();
    let fill = if map.has(numeric_field) {
        let present: Vec<f64> = parsed.iter().flatten().copied().collect();
        policy.fill_value(&present)
    } else {
        None
    };

    // 2) build rows, dropping what cannot be completed
    let mut out = Vec::with_capacity(table.rows.len());
    let mut seen: HashSet<&RawRecord> = HashSet::with_capacity(table.rows.len());
    for (row, value) in table.rows.iter().zip(parsed) {
        let (value, imputed) = match (value, fill) {
            (Some(v), _) => (v, false),
            (None, Some(f)) => (f, true),
            (None, None) => {
                stats.dropped_missing += 1;
                continue;
            }
        };
        let Some(normalized) = build(row, value) else {
            stats.dropped_missing += 1;
            continue;
        };

        // 3) exact-duplicate removal over the whole source row, first occurrence wins
        if !seen.insert(row) {
            stats.duplicates += 1;
            continue;
        }
        if imputed {
            stats.imputed += 1;
        }
        out.push(normalized);
    }

    stats.output_rows = out.len();
    info!(
        file = %table.source,
        input = stats.input_rows,
        output = stats.output_rows,
        dropped = stats.dropped_missing,
        imputed = stats.imputed,
        duplicates = stats.duplicates,
        "normalized"
    );
    (out, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::parse_table;

    fn reparse<R: NormalizedRow>(rows: &[R]) -> RawTable {
        let headers: Vec<String> = rows
            .first()
            .map(|r| r.to_record().keys().cloned().collect())
            .unwrap_or_default();
        RawTable {
            source: "renormalized".into(),
            headers,
            rows: rows.iter().map(NormalizedRow::to_record).collect(),
            stats: Default::default(),
        }
    }

    const OPENAQ: &str = "Country Code;City;Location;Pollutant;Unit;Value;Last Updated;Country Label\n\
IN;Delhi;Anand Vihar;PM2.5;µg/m³;180;2020-01-01T00:00:00+00:00;India\n\
IN;Delhi;Anand Vihar;PM2.5;µg/m³;180;2020-01-01T00:00:00+00:00;India\n\
FR;Paris;Les Halles;NO2;µg/m³;;2020-01-02T00:00:00+00:00;France\n\
FR;Paris;Les Halles;NO2;µg/m³;40;;France\n\
US;;Site 9;O3;ppm;0.03;2020-01-03T00:00:00+00:00;United States\n";

    #[test]
    fn air_quality_drop_policy() {
        let table = parse_table("openaq.csv", OPENAQ);
        let (rows, stats) = normalize_air_quality(&table, MissingPolicy::Drop);

        assert_eq!(rows.len(), 2);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.dropped_missing, 2);
        assert_eq!(stats.imputed, 0);

        assert_eq!(rows[0].city_key(), "Delhi");
        assert_eq!(rows[0].country.as_deref(), Some("India"));
        assert_eq!(rows[0].parameter, "PM2.5");
        assert_eq!(rows[1].city, None);
        assert_eq!(rows[1].city_key(), "Site 9");
    }

    #[test]
    fn air_quality_mean_imputation() {
        let table = parse_table("openaq.csv", OPENAQ);
        let (rows, stats) = normalize_air_quality(&table, MissingPolicy::Mean);

        // the Paris row with an empty value is filled; the one without a timestamp is still dropped
        assert_eq!(rows.len(), 3);
        assert_eq!(stats.imputed, 1);
        let paris = rows.iter().find(|r| r.city_key() == "Paris").unwrap();
        let expected = (180.0 + 180.0 + 40.0 + 0.03) / 4.0;
        assert!((paris.value - expected).abs() < 1e-9);
    }

    #[test]
    fn temperature_rows_and_missing_values() {
        let text = "dt,AverageTemperature,AverageTemperatureUncertainty,City,Country\n\
1850-01-01,25.0,0.5,Delhi,India\n\
1850-02-01,,0.5,Delhi,India\n\
1850-03-01,27.0,0.5,,India\n";
        let table = parse_table("temps.csv", text);

        let (rows, stats) = normalize_temperature(&table, MissingPolicy::Drop);
        assert_eq!(rows.len(), 2);
        assert_eq!(stats.dropped_missing, 1);
        assert_eq!(rows[1].city, None);
        assert_eq!(rows[1].country.as_deref(), Some("India"));

        let (rows, stats) = normalize_temperature(&table, MissingPolicy::Median);
        assert_eq!(rows.len(), 3);
        assert_eq!(stats.imputed, 1);
        assert_eq!(rows[1].temperature, 26.0);
    }

    #[test]
    fn normalizing_twice_changes_nothing() {
        let table = parse_table("openaq.csv", OPENAQ);
        let (first, _) = normalize_air_quality(&table, MissingPolicy::Median);
        let (second, stats) = normalize_air_quality(&reparse(&first), MissingPolicy::Median);
        assert_eq!(first, second);
        assert_eq!(stats.imputed, 0);
        assert_eq!(stats.dropped_missing, 0);

        let text = "dt,LandAverageTemperature\n1750-01-01,3.034\n1750-02-01,\n";
        let (first, _) = normalize_temperature(&parse_table("g.csv", text), MissingPolicy::Mean);
        let (second, _) = normalize_temperature(&reparse(&first), MissingPolicy::Mean);
        assert_eq!(first, second);
        assert_eq!(
            reparse(&second).headers,
            vec!["city", "country", "date", "temperature"]
        );
    }

    #[test]
    fn missing_numeric_column_yields_nothing() {
        let table = parse_table("t.csv", "dt,Country\n2000-01-01,India\n");
        let (rows, stats) = normalize_temperature(&table, MissingPolicy::Mean);
        assert!(rows.is_empty());
        assert_eq!(stats.dropped_missing, 1);
    }

    #[test]
    fn rows_differing_only_in_unmapped_columns_are_kept() {
        let text = "dt,AverageTemperature,City,Country,Latitude,Longitude\n\
1850-01-01,25.0,Springfield,United States,39.38N,89.64W\n\
1850-01-01,25.0,Springfield,United States,42.10N,72.59W\n\
1850-01-01,25.0,Springfield,United States,42.10N,72.59W\n";
        let (rows, stats) = normalize_temperature(&parse_table("ByCity.csv", text), MissingPolicy::Drop);
        assert_eq!(rows.len(), 2);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(rows[0], rows[1]);
    }
}

// src/clean/types.rs

use serde::Serialize;

use crate::load::RawRecord;

/// One air-quality observation after normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirQualityRow {
    pub location: String,
    pub city: Option<String>,
    pub country: Option<String>,
    /// Pollutant identifier, e.g. `PM2.5`.
    pub parameter: String,
    pub value: f64,
    /// Empty when the source has no unit.
    pub unit: String,
    pub timestamp: String,
}

impl AirQualityRow {
    /// Grouping key for per-city summaries: the city, else the location.
    pub fn city_key(&self) -> &str {
        self.city.as_deref().unwrap_or(&self.location)
    }
}

/// One temperature observation after normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureRow {
    pub date: String,
    pub country: Option<String>,
    pub city: Option<String>,
    pub temperature: f64,
}

/// A row type the normalizer produces.
pub trait NormalizedRow: Sized {
    /// The raw date/timestamp cell the time features are derived from.
    fn timestamp(&self) -> &str;

    /// Back to a raw record under canonical column names. Feeding this
    /// through the normalizer again gives back an identical row.
    fn to_record(&self) -> RawRecord;
}

impl NormalizedRow for AirQualityRow {
    fn timestamp(&self) -> &str {
        &self.timestamp
    }

    fn to_record(&self) -> RawRecord {
        let mut r = RawRecord::new();
        r.insert("location".into(), self.location.clone());
        r.insert("city".into(), self.city.clone().unwrap_or_default());
        r.insert("country".into(), self.country.clone().unwrap_or_default());
        r.insert("parameter".into(), self.parameter.clone());
        r.insert("value".into(), self.value.to_string());
        r.insert("unit".into(), self.unit.clone());
        r.insert("timestamp".into(), self.timestamp.clone());
        r
    }
}

impl NormalizedRow for TemperatureRow {
    fn timestamp(&self) -> &str {
        &self.date
    }

    fn to_record(&self) -> RawRecord {
        let mut r = RawRecord::new();
        r.insert("date".into(), self.date.clone());
        r.insert("country".into(), self.country.clone().unwrap_or_default());
        r.insert("city".into(), self.city.clone().unwrap_or_default());
        r.insert("temperature".into(), self.temperature.to_string());
        r
    }
}

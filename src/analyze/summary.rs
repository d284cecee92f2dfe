// src/analyze/summary.rs

use serde::Serialize;

use crate::stats;

/// Stable identifiers of the charted summaries. Used as the file stem of
/// both the CSV table and the chart image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryId {
    TopPollutedCities,
    HottestCountries,
    GlobalTemperatureTrend,
    CountryTemperatureTrends,
    CityTemperatureTrends,
    PollutantDistribution,
    TemperatureVsAqi,
}

impl SummaryId {
    pub const ALL: [SummaryId; 7] = [
        SummaryId::TopPollutedCities,
        SummaryId::HottestCountries,
        SummaryId::GlobalTemperatureTrend,
        SummaryId::CountryTemperatureTrends,
        SummaryId::CityTemperatureTrends,
        SummaryId::PollutantDistribution,
        SummaryId::TemperatureVsAqi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryId::TopPollutedCities => "top_polluted_cities",
            SummaryId::HottestCountries => "hottest_countries",
            SummaryId::GlobalTemperatureTrend => "global_temperature_trend",
            SummaryId::CountryTemperatureTrends => "country_temperature_trends",
            SummaryId::CityTemperatureTrends => "city_temperature_trends",
            SummaryId::PollutantDistribution => "pollutant_distribution",
            SummaryId::TemperatureVsAqi => "temperature_vs_aqi",
        }
    }
}

/// Anything persisted as a summary CSV.
pub trait SummaryTable {
    fn name(&self) -> &str;
    fn header(&self) -> Vec<&'static str>;
    fn records(&self) -> Vec<Vec<String>>;

    fn is_empty(&self) -> bool {
        self.records().is_empty()
    }
}

pub(crate) fn fmt_num(v: f64) -> String {
    format!("{:.4}", v)
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(fmt_num).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankEntry {
    pub key: String,
    pub mean: f64,
    pub count: usize,
}

/// Groups ranked by mean, descending, truncated to N.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking {
    pub id: SummaryId,
    pub key_label: &'static str,
    pub entries: Vec<RankEntry>,
}

impl SummaryTable for Ranking {
    fn name(&self) -> &str {
        self.id.as_str()
    }

    fn header(&self) -> Vec<&'static str> {
        vec![self.key_label, "mean", "count"]
    }

    fn records(&self) -> Vec<Vec<String>> {
        self.entries
            .iter()
            .map(|e| vec![e.key.clone(), fmt_num(e.mean), e.count.to_string()])
            .collect()
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub year: i32,
    pub mean: f64,
    pub count: usize,
}

/// Yearly means, years ascending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trend {
    pub id: SummaryId,
    pub points: Vec<TrendPoint>,
}

impl SummaryTable for Trend {
    fn name(&self) -> &str {
        self.id.as_str()
    }

    fn header(&self) -> Vec<&'static str> {
        vec!["year", "mean", "count"]
    }

    fn records(&self) -> Vec<Vec<String>> {
        self.points
            .iter()
            .map(|p| vec![p.year.to_string(), fmt_num(p.mean), p.count.to_string()])
            .collect()
    }

    fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthPoint {
    pub year: i32,
    pub month: u32,
    pub mean: f64,
    pub count: usize,
}

/// Mean temperature per calendar month, oldest first. Table only; the
/// yearly trend is what gets charted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTrend {
    pub points: Vec<MonthPoint>,
}

impl MonthlyTrend {
    pub const NAME: &'static str = "global_monthly_temperature";
}

impl SummaryTable for MonthlyTrend {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn header(&self) -> Vec<&'static str> {
        vec!["year", "month", "mean", "count"]
    }

    fn records(&self) -> Vec<Vec<String>> {
        self.points
            .iter()
            .map(|p| {
                vec![
                    p.year.to_string(),
                    format!("{:02}", p.month),
                    fmt_num(p.mean),
                    p.count.to_string(),
                ]
            })
            .collect()
    }

    fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSeries {
    pub place: String,
    pub points: Vec<TrendPoint>,
}

/// One yearly trend per place (country or city).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSet {
    pub id: SummaryId,
    pub place_label: &'static str,
    pub series: Vec<TrendSeries>,
}

impl SummaryTable for TrendSet {
    fn name(&self) -> &str {
        self.id.as_str()
    }

    fn header(&self) -> Vec<&'static str> {
        vec![self.place_label, "year", "mean", "count"]
    }

    fn records(&self) -> Vec<Vec<String>> {
        self.series
            .iter()
            .flat_map(|s| {
                s.points.iter().map(move |p| {
                    vec![
                        s.place.clone(),
                        p.year.to_string(),
                        fmt_num(p.mean),
                        p.count.to_string(),
                    ]
                })
            })
            .collect()
    }

    fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.points.is_empty())
    }
}

/// count/mean/std/min/quartiles/max of one group of values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub key: String,
    pub count: usize,
    pub mean: f64,
    pub std: Option<f64>,
    pub min: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub max: f64,
}

impl GroupStats {
    /// `None` for an empty group.
    pub fn from_values(key: impl Into<String>, values: &[f64]) -> Option<Self> {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        Some(Self {
            key: key.into(),
            count: sorted.len(),
            mean: stats::mean(&sorted)?,
            std: stats::std_dev(&sorted),
            min: *sorted.first()?,
            p25: stats::quantile_sorted(&sorted, 0.25)?,
            median: stats::quantile_sorted(&sorted, 0.5)?,
            p75: stats::quantile_sorted(&sorted, 0.75)?,
            max: *sorted.last()?,
        })
    }
}

/// A table of `GroupStats`: the pollutant distribution and the per-dataset
/// descriptions share this shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsTable {
    pub name: String,
    pub key_label: &'static str,
    pub groups: Vec<GroupStats>,
}

impl SummaryTable for StatsTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn header(&self) -> Vec<&'static str> {
        vec![
            self.key_label,
            "count",
            "mean",
            "std",
            "min",
            "25%",
            "50%",
            "75%",
            "max",
        ]
    }

    fn records(&self) -> Vec<Vec<String>> {
        self.groups
            .iter()
            .map(|g| {
                vec![
                    g.key.clone(),
                    g.count.to_string(),
                    fmt_num(g.mean),
                    fmt_opt(g.std),
                    fmt_num(g.min),
                    fmt_num(g.p25),
                    fmt_num(g.median),
                    fmt_num(g.p75),
                    fmt_num(g.max),
                ]
            })
            .collect()
    }

    fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairedPoint {
    pub place: String,
    pub year: i32,
    pub temperature: f64,
    pub aqi: f64,
}

/// Temperature and pollutant means paired on (city, year).
/// `coefficient` is `None` when it is undefined, never zero by default.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Correlation {
    pub pairs: Vec<PairedPoint>,
    pub coefficient: Option<f64>,
}

impl SummaryTable for Correlation {
    fn name(&self) -> &str {
        SummaryId::TemperatureVsAqi.as_str()
    }

    fn header(&self) -> Vec<&'static str> {
        vec!["place", "year", "temperature", "aqi"]
    }

    fn records(&self) -> Vec<Vec<String>> {
        self.pairs
            .iter()
            .map(|p| {
                vec![
                    p.place.clone(),
                    p.year.to_string(),
                    fmt_num(p.temperature),
                    fmt_num(p.aqi),
                ]
            })
            .collect()
    }

    /// No usable coefficient means nothing to chart.
    fn is_empty(&self) -> bool {
        self.coefficient.is_none()
    }
}

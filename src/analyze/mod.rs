// src/analyze/mod.rs
pub mod group;
pub mod summary;
pub mod write;

use std::collections::BTreeMap;
use tracing::info;

use crate::clean::{AirQualityRow, Dated, TemperatureRow};
use crate::stats;
use group::group_in_order;
pub use summary::{
    Correlation, GroupStats, MonthPoint, MonthlyTrend, PairedPoint, RankEntry, Ranking,
    StatsTable, SummaryId, SummaryTable, Trend, TrendPoint, TrendSeries, TrendSet,
};
pub use write::write_summary;

/// Every summary produced by one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Summaries {
    pub polluted_cities: Ranking,
    pub hottest_countries: Ranking,
    pub global_trend: Trend,
    pub monthly_trend: MonthlyTrend,
    pub country_trends: TrendSet,
    pub city_trends: TrendSet,
    pub pollutant_distribution: StatsTable,
    pub correlation: Correlation,
    /// One descriptive table per loaded input file.
    pub descriptions: Vec<StatsTable>,
}

impl Summaries {
    pub fn tables(&self) -> Vec<&dyn SummaryTable> {
        let mut out: Vec<&dyn SummaryTable> = vec![
            &self.polluted_cities,
            &self.hottest_countries,
            &self.global_trend,
            &self.monthly_trend,
            &self.country_trends,
            &self.city_trends,
            &self.pollutant_distribution,
            &self.correlation,
        ];
        out.extend(self.descriptions.iter().map(|d| d as &dyn SummaryTable));
        out
    }
}

/// The dated rows of one input file.
#[derive(Debug, Clone, Copy)]
pub enum DatasetRows<'a> {
    AirQuality(&'a [Dated<AirQualityRow>]),
    Temperature(&'a [Dated<TemperatureRow>]),
}

/// One input file, described on its own as `<name>_summary`.
#[derive(Debug, Clone, Copy)]
pub struct Dataset<'a> {
    pub name: &'a str,
    pub rows: DatasetRows<'a>,
}

/// Compute every summary. `air` and `temps` hold all rows of their kind;
/// `datasets` are the same rows split by input file.
#[tracing::instrument(level = "info", skip_all, fields(aq = air.len(), temp = temps.len(), files = datasets.len()))]
pub fn summarize(
    air: &[Dated<AirQualityRow>],
    temps: &[Dated<TemperatureRow>],
    datasets: &[Dataset<'_>],
    top_n: usize,
) -> Summaries {
    let summaries = Summaries {
        polluted_cities: top_polluted_cities(air, top_n),
        hottest_countries: hottest_countries(temps, top_n),
        global_trend: global_trend(temps),
        monthly_trend: monthly_trend(temps),
        country_trends: place_trends(
            SummaryId::CountryTemperatureTrends,
            "country",
            temps,
            |r| r.country.as_deref(),
        ),
        city_trends: place_trends(SummaryId::CityTemperatureTrends, "city", temps, |r| {
            r.city.as_deref()
        }),
        pollutant_distribution: pollutant_distribution(air),
        correlation: temperature_aqi_correlation(temps, air),
        descriptions: datasets.iter().map(describe_dataset).collect(),
    };
    info!(
        polluted = summaries.polluted_cities.entries.len(),
        hottest = summaries.hottest_countries.entries.len(),
        years = summaries.global_trend.points.len(),
        pollutants = summaries.pollutant_distribution.groups.len(),
        correlation = ?summaries.correlation.coefficient,
        "summaries computed"
    );
    summaries
}

/// Mean per group, stable-sorted descending, first `n` kept. Equal means
/// keep first-appearance order.
fn rank_by_mean<K>(groups: Vec<(K, Vec<f64>)>, n: usize) -> Vec<RankEntry>
where
    K: Into<String>,
{
    let mut entries: Vec<RankEntry> = groups
        .into_iter()
        .filter_map(|(key, values)| {
            Some(RankEntry {
                count: values.len(),
                mean: stats::mean(&values)?,
                key: key.into(),
            })
        })
        .collect();
    entries.sort_by(|a, b| b.mean.total_cmp(&a.mean));
    entries.truncate(n);
    entries
}

/// Cities by mean pollutant value, across all pollutants.
pub fn top_polluted_cities(rows: &[Dated<AirQualityRow>], n: usize) -> Ranking {
    let groups = group_in_order(rows.iter().map(|d| (d.row.city_key(), d.row.value)));
    Ranking {
        id: SummaryId::TopPollutedCities,
        key_label: "city",
        entries: rank_by_mean(groups, n),
    }
}

/// Countries by mean temperature. Rows without a country are ignored.
pub fn hottest_countries(rows: &[Dated<TemperatureRow>], n: usize) -> Ranking {
    let groups = group_in_order(
        rows.iter()
            .filter_map(|d| d.row.country.as_deref().map(|c| (c, d.row.temperature))),
    );
    Ranking {
        id: SummaryId::HottestCountries,
        key_label: "country",
        entries: rank_by_mean(groups, n),
    }
}

fn yearly_means<I>(items: I) -> Vec<TrendPoint>
where
    I: IntoIterator<Item = (i32, f64)>,
{
    let mut by_year: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for (year, v) in items {
        by_year.entry(year).or_default().push(v);
    }
    by_year
        .into_iter()
        .filter_map(|(year, values)| {
            Some(TrendPoint {
                year,
                count: values.len(),
                mean: stats::mean(&values)?,
            })
        })
        .collect()
}

/// Mean temperature per year over every row, years ascending.
pub fn global_trend(rows: &[Dated<TemperatureRow>]) -> Trend {
    Trend {
        id: SummaryId::GlobalTemperatureTrend,
        points: yearly_means(rows.iter().map(|d| (d.time().year(), d.row.temperature))),
    }
}

/// Mean temperature per (year, month) over every row, oldest first.
pub fn monthly_trend(rows: &[Dated<TemperatureRow>]) -> MonthlyTrend {
    let mut by_month: BTreeMap<(i32, u32), Vec<f64>> = BTreeMap::new();
    for d in rows {
        by_month
            .entry((d.time().year(), d.time().month()))
            .or_default()
            .push(d.row.temperature);
    }
    MonthlyTrend {
        points: by_month
            .into_iter()
            .filter_map(|((year, month), values)| {
                Some(MonthPoint {
                    year,
                    month,
                    count: values.len(),
                    mean: stats::mean(&values)?,
                })
            })
            .collect(),
    }
}

/// Yearly trend per place. Places with the most years come first; equal
/// spans are ordered by name.
pub fn place_trends<F>(
    id: SummaryId,
    place_label: &'static str,
    rows: &[Dated<TemperatureRow>],
    place: F,
) -> TrendSet
where
    F: Fn(&TemperatureRow) -> Option<&str>,
{
    let groups = group_in_order(rows.iter().filter_map(|d| {
        place(&d.row).map(|p| (p.to_string(), (d.time().year(), d.row.temperature)))
    }));
    let mut series: Vec<TrendSeries> = groups
        .into_iter()
        .map(|(place, items)| TrendSeries {
            place,
            points: yearly_means(items),
        })
        .collect();
    series.sort_by(|a, b| {
        b.points
            .len()
            .cmp(&a.points.len())
            .then_with(|| a.place.cmp(&b.place))
    });
    TrendSet {
        id,
        place_label,
        series,
    }
}

/// Per-pollutant count/mean/quartiles. Most observed pollutant first.
pub fn pollutant_distribution(rows: &[Dated<AirQualityRow>]) -> StatsTable {
    let groups = group_in_order(rows.iter().map(|d| (d.row.parameter.as_str(), d.row.value)));
    let mut stats: Vec<GroupStats> = groups
        .into_iter()
        .filter_map(|(key, values)| GroupStats::from_values(key, &values))
        .collect();
    stats.sort_by(|a, b| b.count.cmp(&a.count));
    StatsTable {
        name: SummaryId::PollutantDistribution.as_str().to_string(),
        key_label: "pollutant",
        groups: stats,
    }
}

fn place_key(place: &str) -> String {
    place.trim().to_lowercase()
}

/// Pair yearly mean temperature with yearly mean pollutant value per city
/// and compute Pearson's r over the pairs.
///
/// Cities are matched case-insensitively. Temperature rows without a city
/// take no part. Pairs are ordered by (city, year).
pub fn temperature_aqi_correlation(
    temps: &[Dated<TemperatureRow>],
    air: &[Dated<AirQualityRow>],
) -> Correlation {
    let mut temp_by_key: BTreeMap<(String, i32), Vec<f64>> = BTreeMap::new();
    for d in temps {
        if let Some(city) = d.row.city.as_deref() {
            temp_by_key
                .entry((place_key(city), d.time().year()))
                .or_default()
                .push(d.row.temperature);
        }
    }

    // display name: first spelling seen on the air-quality side
    let mut aqi_by_key: BTreeMap<(String, i32), (String, Vec<f64>)> = BTreeMap::new();
    for d in air {
        let city = d.row.city_key();
        aqi_by_key
            .entry((place_key(city), d.time().year()))
            .or_insert_with(|| (city.to_string(), Vec::new()))
            .1
            .push(d.row.value);
    }

    let pairs: Vec<PairedPoint> = aqi_by_key
        .into_iter()
        .filter_map(|((key, year), (place, aqi))| {
            let temperatures = temp_by_key.get(&(key, year))?;
            Some(PairedPoint {
                place,
                year,
                temperature: stats::mean(temperatures)?,
                aqi: stats::mean(&aqi)?,
            })
        })
        .collect();

    let xy: Vec<(f64, f64)> = pairs.iter().map(|p| (p.temperature, p.aqi)).collect();
    Correlation {
        coefficient: stats::pearson(&xy),
        pairs,
    }
}

/// count/mean/std/quartiles of the numeric field and the year of one
/// dataset, named `<dataset>_summary`.
pub fn describe_dataset(dataset: &Dataset<'_>) -> StatsTable {
    let fields = match dataset.rows {
        DatasetRows::AirQuality(rows) => [
            ("value", rows.iter().map(|d| d.row.value).collect::<Vec<_>>()),
            ("year", rows.iter().map(|d| d.time().year() as f64).collect()),
        ],
        DatasetRows::Temperature(rows) => [
            ("temperature", rows.iter().map(|d| d.row.temperature).collect::<Vec<_>>()),
            ("year", rows.iter().map(|d| d.time().year() as f64).collect()),
        ],
    };
    describe(&format!("{}_summary", dataset.name), &fields)
}

fn describe(name: &str, fields: &[(&str, Vec<f64>)]) -> StatsTable {
    StatsTable {
        name: name.to_string(),
        key_label: "field",
        groups: fields
            .iter()
            .filter_map(|(field, values)| GroupStats::from_values(*field, values))
            .collect(),
    }
}

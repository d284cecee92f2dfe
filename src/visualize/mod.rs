// src/visualize/mod.rs
pub mod charts;

use anyhow::Result;
use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};
use std::{fs, io::ErrorKind, path::Path};
use tracing::{error, info, warn};

use crate::analyze::{Ranking, SummaryId, SummaryTable, Summaries, TrendSeries};
use charts::Labels;

/// Chart image extension. SVG needs no system fonts to render text.
pub const CHART_EXT: &str = "svg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
    Histogram,
    Scatter,
}

/// What each chart is, before any data is looked at.
#[derive(Debug, Clone, Copy)]
pub struct ChartSpec {
    pub id: SummaryId,
    pub kind: ChartKind,
    pub title: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
}

pub const CHARTS: [ChartSpec; 7] = [
    ChartSpec {
        id: SummaryId::TopPollutedCities,
        kind: ChartKind::Bar,
        title: "Most Polluted Cities",
        x_label: "City",
        y_label: "Average pollutant value",
    },
    ChartSpec {
        id: SummaryId::HottestCountries,
        kind: ChartKind::Bar,
        title: "Hottest Countries",
        x_label: "Country",
        y_label: "Average temperature (°C)",
    },
    ChartSpec {
        id: SummaryId::GlobalTemperatureTrend,
        kind: ChartKind::Line,
        title: "Global Average Temperature Over Years",
        x_label: "Year",
        y_label: "Temperature (°C)",
    },
    ChartSpec {
        id: SummaryId::CountryTemperatureTrends,
        kind: ChartKind::Line,
        title: "Temperature Trend by Country",
        x_label: "Year",
        y_label: "Temperature (°C)",
    },
    ChartSpec {
        id: SummaryId::CityTemperatureTrends,
        kind: ChartKind::Line,
        title: "Temperature Trend by City",
        x_label: "Year",
        y_label: "Temperature (°C)",
    },
    ChartSpec {
        id: SummaryId::PollutantDistribution,
        kind: ChartKind::Histogram,
        title: "Observations per Pollutant",
        x_label: "Pollutant",
        y_label: "Observations",
    },
    ChartSpec {
        id: SummaryId::TemperatureVsAqi,
        kind: ChartKind::Scatter,
        title: "Temperature vs AQI",
        x_label: "Average temperature (°C)",
        y_label: "Average pollutant value",
    },
];

pub fn chart_file_name(id: SummaryId) -> String {
    format!("{}.{}", id.as_str(), CHART_EXT)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOutcome {
    pub rendered: Vec<String>,
    /// Charts with no data behind them.
    pub skipped: Vec<String>,
    /// Charts whose drawing failed; the rest of the batch still ran.
    pub failed: Vec<String>,
}

/// Render every chart into `out_dir`, overwriting files of the same name.
///
/// An empty summary skips its chart and removes any earlier image of it. A
/// drawing error is logged. Neither stops the remaining charts.
#[tracing::instrument(level = "info", skip(summaries, out_dir), fields(dir = %out_dir.display()))]
pub fn render_all(summaries: &Summaries, out_dir: &Path, trend_series: usize) -> RenderOutcome {
    let mut outcome = RenderOutcome::default();

    for spec in &CHARTS {
        let name = spec.id.as_str().to_string();
        let path = out_dir.join(chart_file_name(spec.id));

        let result = match spec.id {
            SummaryId::TopPollutedCities => render_ranking(
                &path,
                spec,
                &summaries.polluted_cities,
                RGBColor(178, 34, 34),
            ),
            SummaryId::HottestCountries => render_ranking(
                &path,
                spec,
                &summaries.hottest_countries,
                RGBColor(220, 120, 60),
            ),
            SummaryId::GlobalTemperatureTrend => {
                let trend = &summaries.global_trend;
                let series = [TrendSeries {
                    place: "global".into(),
                    points: trend.points.clone(),
                }];
                draw_if(trend, || charts::line_chart(&path, &labels(spec, None), &series))
            }
            SummaryId::CountryTemperatureTrends => {
                let set = &summaries.country_trends;
                let shown = &set.series[..set.series.len().min(trend_series)];
                draw_if(set, || charts::line_chart(&path, &labels(spec, None), shown))
            }
            SummaryId::CityTemperatureTrends => {
                let set = &summaries.city_trends;
                let shown = &set.series[..set.series.len().min(trend_series)];
                draw_if(set, || charts::line_chart(&path, &labels(spec, None), shown))
            }
            SummaryId::PollutantDistribution => {
                let dist = &summaries.pollutant_distribution;
                let bars: Vec<(String, f64)> = dist
                    .groups
                    .iter()
                    .map(|g| (g.key.clone(), g.count as f64))
                    .collect();
                draw_if(dist, || {
                    charts::bar_chart(&path, &labels(spec, None), &bars, RGBColor(0, 128, 128))
                })
            }
            SummaryId::TemperatureVsAqi => {
                let corr = &summaries.correlation;
                let suffix = corr.coefficient.map(|r| format!("(r = {:.2})", r));
                draw_if(corr, || {
                    charts::scatter_chart(&path, &labels(spec, suffix.as_deref()), &corr.pairs)
                })
            }
        };

        match result {
            Ok(true) => {
                info!(chart = %name, kind = ?spec.kind, "rendered");
                outcome.rendered.push(name);
            }
            Ok(false) => {
                warn!(chart = %name, "no data; chart skipped");
                remove_stale(&path);
                outcome.skipped.push(name);
            }
            Err(e) => {
                error!(chart = %name, "render failed: {:#}", e);
                outcome.failed.push(name);
            }
        }
    }

    info!(
        rendered = outcome.rendered.len(),
        skipped = outcome.skipped.len(),
        failed = outcome.failed.len(),
        "charts done"
    );
    outcome
}

/// Drop a chart left by an earlier run so it is not shown beside this run's
/// empty table.
fn remove_stale(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => info!(path = %path.display(), "removed chart from previous run"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => error!(path = %path.display(), "could not remove stale chart: {}", e),
    }
}

fn labels(spec: &ChartSpec, title_suffix: Option<&str>) -> Labels {
    let title = match title_suffix {
        Some(s) => format!("{} {}", spec.title, s),
        None => spec.title.to_string(),
    };
    Labels {
        title,
        x: spec.x_label.to_string(),
        y: spec.y_label.to_string(),
    }
}

/// Run `draw` unless the table is empty. `Ok(false)` means skipped.
fn draw_if<F>(table: &dyn SummaryTable, draw: F) -> Result<bool>
where
    F: FnOnce() -> Result<()>,
{
    if table.is_empty() {
        return Ok(false);
    }
    draw()?;
    Ok(true)
}

fn render_ranking(
    path: &Path,
    spec: &ChartSpec,
    ranking: &Ranking,
    color: RGBColor,
) -> Result<bool> {
    let bars: Vec<(String, f64)> = ranking
        .entries
        .iter()
        .map(|e| (e.key.clone(), e.mean))
        .collect();
    draw_if(ranking, || charts::bar_chart(path, &labels(spec, None), &bars, color))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::summarize;
    use crate::clean::{AirQualityRow, Dated, TemperatureRow, TimeFields};
    use chrono::NaiveDate;

    #[test]
    fn empty_summaries_skip_every_chart() -> Result<()> {
        crate::init_test_logging();
        let dir = tempfile::tempdir()?;
        let summaries = summarize(&[], &[], &[], 10);

        let outcome = render_all(&summaries, dir.path(), 5);
        assert!(outcome.rendered.is_empty());
        assert!(outcome.failed.is_empty());
        assert_eq!(outcome.skipped.len(), CHARTS.len());
        assert_eq!(fs::read_dir(dir.path())?.count(), 0);
        Ok(())
    }

    #[test]
    fn renders_available_charts_and_skips_the_rest() -> Result<()> {
        crate::init_test_logging();
        let dir = tempfile::tempdir()?;
        let at = |y| TimeFields::from_date(NaiveDate::from_ymd_opt(y, 1, 1).unwrap());
        let air = vec![
            Dated::new(
                AirQualityRow {
                    location: "s1".into(),
                    city: Some("Delhi".into()),
                    country: None,
                    parameter: "pm25".into(),
                    value: 150.0,
                    unit: "µg/m³".into(),
                    timestamp: "2020-01-01".into(),
                },
                at(2020),
            ),
        ];
        let temps = vec![
            Dated::new(
                TemperatureRow {
                    date: "2019-01-01".into(),
                    country: Some("India".into()),
                    city: None,
                    temperature: 25.0,
                },
                at(2019),
            ),
            Dated::new(
                TemperatureRow {
                    date: "2020-01-01".into(),
                    country: Some("India".into()),
                    city: None,
                    temperature: 26.0,
                },
                at(2020),
            ),
        ];
        let summaries = summarize(&air, &temps, &[], 10);

        let outcome = render_all(&summaries, dir.path(), 5);
        assert!(outcome.failed.is_empty(), "failed: {:?}", outcome.failed);
        assert_eq!(
            outcome.skipped,
            vec!["city_temperature_trends", "temperature_vs_aqi"]
        );
        for name in &outcome.rendered {
            let path = dir.path().join(format!("{name}.{CHART_EXT}"));
            let svg = fs::read_to_string(&path)?;
            assert!(svg.contains("<svg"), "{name} is not an svg");
        }
        assert!(fs::read_to_string(dir.path().join("global_temperature_trend.svg"))?
            .contains("Global Average Temperature"));
        Ok(())
    }

    #[test]
    fn skipped_chart_removes_earlier_image() -> Result<()> {
        crate::init_test_logging();
        let dir = tempfile::tempdir()?;
        let stale = dir.path().join(chart_file_name(SummaryId::TopPollutedCities));
        fs::write(&stale, "<svg>last run</svg>")?;

        let outcome = render_all(&summarize(&[], &[], &[], 10), dir.path(), 5);
        assert!(outcome.skipped.contains(&"top_polluted_cities".to_string()));
        assert!(!stale.exists());
        Ok(())
    }
}

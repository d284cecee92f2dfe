// src/pipeline.rs

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    ops::Range,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

use crate::analyze::{self, write_summary, Dataset, DatasetRows};
use crate::clean::{self, extract_time_features, NormalizeStats};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::load::{self, LoadStats, RawTable};
use crate::visualize::{self, RenderOutcome};

pub const REPORT_FILE: &str = "run_report.json";

/// Per-dataset counts, from raw rows to dated rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetReport {
    pub load: LoadStats,
    pub normalize: NormalizeStats,
    /// Rows dropped because their timestamp did not parse.
    pub undated: usize,
    pub rows: usize,
}

/// What one run did. Written to `run_report.json` in the output directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub air_quality: DatasetReport,
    pub temperature: DatasetReport,
    /// Summary CSV file names, in write order.
    pub tables: Vec<String>,
    pub charts: RenderOutcome,
    pub correlation: Option<f64>,
}

/// Read the report of the last run, if there is a readable one.
pub fn read_report(output_dir: &Path) -> Option<RunReport> {
    let path = output_dir.join(REPORT_FILE);
    let text = fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&text) {
        Ok(report) => Some(report),
        Err(e) => {
            warn!(path = %path.display(), "ignoring unreadable run report: {}", e);
            None
        }
    }
}

/// Load every input file. Any missing input aborts here, before a single
/// output file is touched.
fn load_inputs(cfg: &PipelineConfig) -> Result<(RawTable, Vec<RawTable>), PipelineError> {
    if !cfg.input_dir.is_dir() {
        return Err(PipelineError::InputDirMissing(cfg.input_dir.clone()));
    }
    let air = load::load_csv(cfg.air_quality_path())?;
    let temps = cfg
        .temperature_paths()
        .iter()
        .map(load::load_csv)
        .collect::<Result<Vec<_>, _>>()?;
    Ok((air, temps))
}

/// Run the whole batch: load, normalize, date, summarize, write tables,
/// render charts, write the run report.
///
/// Only input and I/O failures are errors. Bad rows are skipped and empty
/// summaries skip their chart.
#[tracing::instrument(level = "info", skip(cfg), fields(input = %cfg.input_dir.display(), output = %cfg.output_dir.display()))]
pub fn run(cfg: &PipelineConfig) -> Result<RunReport> {
    let started_at = Utc::now();
    cfg.validate()?;

    // 1) load
    let (air_table, temp_tables) = load_inputs(cfg)?;

    // 2) normalize + time features, one file at a time
    let (air_rows, air_norm) = clean::normalize_air_quality(&air_table, cfg.missing.value);
    let (air, air_undated) = extract_time_features(air_rows, &cfg.date_formats);

    let mut temps = Vec::new();
    let mut spans: Vec<Range<usize>> = Vec::with_capacity(temp_tables.len());
    let mut temp_norm = NormalizeStats::default();
    let mut temp_load = LoadStats::default();
    let mut temp_undated = 0;
    for table in &temp_tables {
        let (rows, stats) = clean::normalize_temperature(table, cfg.missing.temperature);
        temp_norm.merge(stats);
        temp_load.total_rows += table.stats.total_rows;
        temp_load.kept_rows += table.stats.kept_rows;
        temp_load.skipped_rows += table.stats.skipped_rows;

        let (dated, undated) = extract_time_features(rows, &cfg.date_formats);
        temp_undated += undated;
        let start = temps.len();
        temps.extend(dated);
        spans.push(start..temps.len());
    }

    // 3) summaries; each file is also described on its own
    let names = cfg.dataset_names();
    let mut datasets = vec![Dataset {
        name: names[0].0.as_str(),
        rows: DatasetRows::AirQuality(&air),
    }];
    for ((name, _), span) in names[1..].iter().zip(&spans) {
        datasets.push(Dataset {
            name: name.as_str(),
            rows: DatasetRows::Temperature(&temps[span.clone()]),
        });
    }
    let summaries = analyze::summarize(&air, &temps, &datasets, cfg.top_n);

    fs::create_dir_all(&cfg.output_dir)
        .with_context(|| format!("creating output dir {}", cfg.output_dir.display()))?;

    let mut tables = Vec::new();
    for table in summaries.tables() {
        let path = write_summary(&cfg.output_dir, table)?;
        if table.is_empty() {
            warn!(table = table.name(), "summary has no data; wrote header only");
        }
        tables.push(file_name(&path));
    }
    info!(count = tables.len(), "summary tables written");

    // 4) charts
    let charts = visualize::render_all(&summaries, &cfg.output_dir, cfg.trend_series);

    let report = RunReport {
        started_at,
        finished_at: Utc::now(),
        air_quality: DatasetReport {
            load: air_table.stats,
            normalize: air_norm,
            undated: air_undated,
            rows: air.len(),
        },
        temperature: DatasetReport {
            load: temp_load,
            normalize: temp_norm,
            undated: temp_undated,
            rows: temps.len(),
        },
        tables,
        charts,
        correlation: summaries.correlation.coefficient,
    };
    write_report(&cfg.output_dir, &report)?;

    info!(
        elapsed_ms = (report.finished_at - report.started_at).num_milliseconds(),
        rendered = report.charts.rendered.len(),
        skipped = report.charts.skipped.len(),
        "pipeline finished"
    );
    Ok(report)
}

fn write_report(dir: &Path, report: &RunReport) -> Result<PathBuf> {
    let path = dir.join(REPORT_FILE);
    let tmp_path = dir.join(format!(".{}.tmp", REPORT_FILE));
    let json = serde_json::to_string_pretty(report).context("serializing run report")?;
    fs::write(&tmp_path, json).with_context(|| format!("writing {}", tmp_path.display()))?;
    fs::rename(&tmp_path, &path)
        .with_context(|| format!("renaming {:?} -> {:?}", tmp_path, path))?;
    Ok(path)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

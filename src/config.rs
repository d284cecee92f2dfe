// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::clean::MissingPolicy;
use crate::error::PipelineError;

/// Everything a pipeline run needs. Each stage receives this (or the part of
/// it it cares about) explicitly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Length of the top-N rankings.
    pub top_n: usize,
    /// chrono format strings, tried in order. RFC 3339 is always accepted.
    pub date_formats: Vec<String>,
    pub datasets: DatasetFiles,
    pub missing: MissingValues,
    /// Maximum number of places drawn on a multi-line trend chart.
    pub trend_series: usize,
}

/// Input file names, relative to `input_dir`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatasetFiles {
    pub air_quality: String,
    pub temperature: Vec<String>,
}

/// Missing-value treatment, one entry per numeric field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct MissingValues {
    /// Air-quality `value`.
    pub value: MissingPolicy,
    pub temperature: MissingPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("visuals"),
            top_n: 10,
            date_formats: vec![
                "%Y-%m-%d".into(),
                "%Y-%m-%d %H:%M:%S".into(),
                "%Y-%m-%dT%H:%M:%S".into(),
                "%Y/%m/%d".into(),
                "%Y/%m/%d %H:%M:%S".into(),
            ],
            datasets: DatasetFiles::default(),
            missing: MissingValues::default(),
            trend_series: 5,
        }
    }
}

impl Default for DatasetFiles {
    fn default() -> Self {
        Self {
            air_quality: "openaq.csv".into(),
            temperature: vec!["GlobalLandTemperaturesByCity.csv".into()],
        }
    }
}

impl PipelineConfig {
    /// Read a YAML config file. Missing keys fall back to the defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let cfg: Self = serde_yaml::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn air_quality_path(&self) -> PathBuf {
        self.input_dir.join(&self.datasets.air_quality)
    }

    pub fn temperature_paths(&self) -> Vec<PathBuf> {
        self.datasets
            .temperature
            .iter()
            .map(|f| self.input_dir.join(f))
            .collect()
    }

    /// Every configured input as (dataset name, file name), air quality first.
    pub fn dataset_names(&self) -> Vec<(String, &str)> {
        std::iter::once(self.datasets.air_quality.as_str())
            .chain(self.datasets.temperature.iter().map(String::as_str))
            .map(|file| (dataset_name(file), file))
            .collect()
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.top_n == 0 {
            return Err(PipelineError::InvalidConfig("top_n must be at least 1".into()));
        }
        if self.datasets.air_quality.trim().is_empty() {
            return Err(PipelineError::InvalidConfig(
                "datasets.air_quality must name a file".into(),
            ));
        }
        if self.datasets.temperature.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "datasets.temperature must list at least one file".into(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for (name, file) in self.dataset_names() {
            if !seen.insert(name.clone()) {
                return Err(PipelineError::InvalidConfig(format!(
                    "{file}: another input already uses the dataset name {name:?}"
                )));
            }
        }
        if self.date_formats.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "date_formats must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Dataset name of an input file: its file stem, e.g.
/// `GlobalLandTemperaturesByCity.csv` → `GlobalLandTemperaturesByCity`.
pub fn dataset_name(file: &str) -> String {
    Path::new(file)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| file.to_string())
}

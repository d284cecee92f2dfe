// src/analyze/write.rs

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

use super::summary::SummaryTable;

/// Write `table` as `<dir>/<name>.csv`, replacing any previous file.
///
/// The CSV is written to a hidden temp file first and renamed over the
/// target, so a reader never sees a half-written table. An empty table is
/// written as its header line.
pub fn write_summary(dir: impl AsRef<Path>, table: &dyn SummaryTable) -> Result<PathBuf> {
    let dir = dir.as_ref();
    let path = dir.join(format!("{}.csv", table.name()));
    let tmp_path = dir.join(format!(".{}.csv.tmp", table.name()));

    {
        let mut wtr = csv::Writer::from_path(&tmp_path)
            .with_context(|| format!("creating {}", tmp_path.display()))?;
        wtr.write_record(table.header())
            .with_context(|| format!("writing header of {}", table.name()))?;
        for record in table.records() {
            wtr.write_record(&record)
                .with_context(|| format!("writing row of {}", table.name()))?;
        }
        wtr.flush()
            .with_context(|| format!("flushing {}", tmp_path.display()))?;
    }

    fs::rename(&tmp_path, &path)
        .with_context(|| format!("renaming {:?} -> {:?}", tmp_path, path))?;
    debug!(table = table.name(), path = %path.display(), "wrote summary");
    Ok(path)
}

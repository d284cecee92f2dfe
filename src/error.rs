// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Fatal input problems. Anything that ends up here aborts the run before
/// any output is written.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input directory not found: {}", .0.display())]
    InputDirMissing(PathBuf),

    #[error("input file not found: {}", .0.display())]
    InputFileMissing(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

use airtemp::{pipeline, PipelineConfig};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

/// Load the air-quality and temperature CSVs, write summary tables and
/// charts to the output directory.
#[derive(Parser, Debug)]
#[command(name = "airtemp", version, about)]
struct Args {
    /// YAML config file. Flags below override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    input_dir: Option<PathBuf>,

    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Length of the top-N rankings.
    #[arg(long)]
    top_n: Option<usize>,
}

impl Args {
    fn into_config(self) -> Result<PipelineConfig> {
        let mut cfg = match &self.config {
            Some(path) => PipelineConfig::from_yaml_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(dir) = self.input_dir {
            cfg.input_dir = dir;
        }
        if let Some(dir) = self.output_dir {
            cfg.output_dir = dir;
        }
        if let Some(n) = self.top_n {
            cfg.top_n = n;
        }
        Ok(cfg)
    }
}

fn main() {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,airtemp=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    if let Err(e) = run(Args::parse()) {
        error!("pipeline failed: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    // ─── 2) resolve config ───────────────────────────────────────────
    let cfg = args.into_config().context("building configuration")?;
    info!(
        input = %cfg.input_dir.display(),
        output = %cfg.output_dir.display(),
        top_n = cfg.top_n,
        "startup"
    );

    // ─── 3) run the batch ────────────────────────────────────────────
    let report = pipeline::run(&cfg)?;
    info!(
        tables = report.tables.len(),
        charts = report.charts.rendered.len(),
        skipped = ?report.charts.skipped,
        failed = ?report.charts.failed,
        "done; outputs in {}",
        cfg.output_dir.display()
    );
    Ok(())
}

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Serve the charts written by `airtemp` as a single dashboard page.
#[derive(Parser, Debug)]
#[command(name = "dashboard", version, about)]
struct Cli {
    /// Directory the pipeline wrote its charts and tables to.
    #[arg(long, default_value = "visuals")]
    visuals_dir: PathBuf,

    /// Bind address.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, default_value = "8050")]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let cli = Cli::parse();
    if !cli.visuals_dir.is_dir() {
        tracing::warn!(
            dir = %cli.visuals_dir.display(),
            "visuals directory does not exist yet; every chart will show a placeholder"
        );
    }

    let app = airtemp::dashboard::router(cli.visuals_dir.clone());

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port).parse()?;
    tracing::info!(%addr, dir = %cli.visuals_dir.display(), "dashboard starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub mod analyze;
pub mod clean;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod load;
pub mod pipeline;
pub mod stats;
pub mod visualize;

pub use config::PipelineConfig;
pub use error::PipelineError;

#[cfg(test)]
pub(crate) fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,airtemp=debug")),
        )
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

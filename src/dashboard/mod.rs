// src/dashboard/mod.rs
//! Read-only web view over the pipeline's output directory.
//!
//! - `GET /`          the dashboard page
//! - `GET /visuals/*` chart images and summary CSVs, straight from disk
pub mod page;

use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use page::{render_page, CAPTIONS};

#[derive(Debug, Clone)]
pub struct DashboardState {
    pub visuals_dir: PathBuf,
}

pub type SharedState = Arc<DashboardState>;

pub fn router(visuals_dir: impl Into<PathBuf>) -> Router {
    let state: SharedState = Arc::new(DashboardState {
        visuals_dir: visuals_dir.into(),
    });
    Router::new()
        .route("/", get(index_handler))
        .nest_service("/visuals", ServeDir::new(&state.visuals_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index_handler(State(state): State<SharedState>) -> Html<String> {
    Html(render_page(&state.visuals_dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::fs;
    use tower::ServiceExt;

    async fn get_path(app: Router, uri: &str) -> Result<(StatusCode, String)> {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty())?)
            .await?;
        let status = resp.status();
        let bytes = resp.into_body().collect().await?.to_bytes();
        Ok((status, String::from_utf8_lossy(&bytes).to_string()))
    }

    #[tokio::test]
    async fn index_lists_every_caption() -> Result<()> {
        crate::init_test_logging();
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("top_polluted_cities.svg"), "<svg/>")?;

        let (status, body) = get_path(router(dir.path()), "/").await?;
        assert_eq!(status, StatusCode::OK);
        for c in &CAPTIONS {
            assert!(body.contains(c.heading), "missing {}", c.heading);
        }
        assert!(body.contains("/visuals/top_polluted_cities.svg"));
        Ok(())
    }

    #[tokio::test]
    async fn index_survives_missing_directory() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (status, body) = get_path(router(dir.path().join("gone")), "/").await?;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("not generated yet"));
        Ok(())
    }

    #[tokio::test]
    async fn serves_files_and_404s_the_rest() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("hottest_countries.svg"), "<svg/>")?;
        let app = router(dir.path());

        let (status, body) = get_path(app.clone(), "/visuals/hottest_countries.svg").await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<svg/>");

        let (status, _) = get_path(app, "/visuals/nope.svg").await?;
        assert_eq!(status, StatusCode::NOT_FOUND);
        Ok(())
    }
}

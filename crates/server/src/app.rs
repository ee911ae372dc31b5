//! Application state, configuration, and router assembly.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use pagesift_core::{AnalyzerConfig, BrowserPool, SessionConfig};

use crate::routes::{analyze_handler, health_handler};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<BrowserPool>,
    pub analyzer: Arc<AnalyzerConfig>,
}

/// Server configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub max_pages: usize,
    pub analyzer: AnalyzerConfig,
}

impl ServerConfig {
    /// Read configuration from `PAGESIFT_*` environment variables, falling
    /// back to defaults for anything unset.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let port = read_env("PAGESIFT_PORT")?.unwrap_or(8080);
        let concurrency: usize = read_env("PAGESIFT_CONCURRENCY")?.unwrap_or(4);
        let max_pages = read_env("PAGESIFT_MAX_PAGES")?.unwrap_or(concurrency);
        let nav_timeout_secs: u64 = read_env("PAGESIFT_NAV_TIMEOUT_SECS")?.unwrap_or(30);

        let mut builder = AnalyzerConfig::builder().concurrency(concurrency).session(SessionConfig {
            nav_timeout: Duration::from_secs(nav_timeout_secs),
            ..Default::default()
        });
        if let Some(secs) = read_env::<u64>("PAGESIFT_BATCH_TIMEOUT_SECS")? {
            builder = builder.batch_timeout(Duration::from_secs(secs));
        }

        Ok(Self { port, max_pages, analyzer: builder.build() })
    }
}

fn read_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>, String>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| format!("invalid value for {}: {}", name, e)),
        Err(_) => Ok(None),
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/analyze", post(analyze_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        // Well past any sane batch; individual navigations carry their own
        // much tighter timeouts.
        .layer(TimeoutLayer::new(Duration::from_secs(600)))
        .with_state(state)
}

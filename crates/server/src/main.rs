//! HTTP boundary for batch page analysis.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pagesift_core::{BrowserPool, PoolConfig};

mod app;
mod routes;

use app::{AppState, ServerConfig, build_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pagesift_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!("fatal: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;
    tracing::info!(port = config.port, concurrency = config.analyzer.concurrency, "configuration loaded");

    // The pool lives for the whole process: launched once before the server
    // accepts traffic, torn down once on shutdown.
    tracing::info!("launching browser pool");
    let pool = Arc::new(BrowserPool::launch(&PoolConfig {
        max_pages: config.max_pages,
        chrome_executable: None,
    })
    .await?);
    tracing::info!("browser pool ready");

    let state = AppState { pool: Arc::clone(&pool), analyzer: Arc::new(config.analyzer.clone()) };
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("listening on http://{}", addr);
    tracing::info!("analysis endpoint: POST http://{}/analyze", addr);
    tracing::info!("health check: GET http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Err(e) = pool.shutdown().await {
        tracing::warn!("browser pool shutdown failed: {}", e);
    }

    served?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::warn!("failed to install the ctrl-c handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

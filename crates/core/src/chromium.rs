//! Chromium implementation of the rendering-engine seam.
//!
//! Drives a headless Chromium process over the Chrome DevTools Protocol via
//! `chromiumoxide`. One browser process serves the whole pool; each task
//! gets its own page (tab), opened at checkout and closed at release.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::engine::{BrowserEngine, PageHandle};
use crate::pool::PoolConfig;
use crate::{Result, SiftError};

/// Arguments passed to every Chromium launch. GPU and sandboxing are
/// disabled so the engine behaves the same inside containers.
const LAUNCH_ARGS: &[&str] = &[
    "--disable-gpu",
    "--no-sandbox",
    "--disable-dev-shm-usage",
    "--remote-debugging-port=0",
];

/// Grace period after launch before the first page is opened, so the
/// browser's target state has settled.
const LAUNCH_SETTLE: Duration = Duration::from_millis(300);

/// A launched Chromium process.
///
/// The CDP event stream is drained on a background task for the lifetime of
/// the engine; dropping events would stall every in-flight command.
pub struct ChromiumEngine {
    browser: Mutex<Browser>,
    event_loop: JoinHandle<()>,
}

impl ChromiumEngine {
    /// Launch a headless Chromium process configured from `config`.
    pub async fn launch(config: &PoolConfig) -> Result<Self> {
        let mut builder = BrowserConfig::builder().new_headless_mode().args(LAUNCH_ARGS.to_vec());
        if let Some(path) = &config.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        let browser_config = builder
            .build()
            .map_err(|e| SiftError::Pool(format!("invalid browser configuration: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| SiftError::Pool(format!("failed to launch browser: {}", e)))?;
        debug!("chromium launched");

        let event_loop = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        tokio::time::sleep(LAUNCH_SETTLE).await;

        Ok(Self { browser: Mutex::new(browser), event_loop })
    }
}

#[async_trait]
impl BrowserEngine for ChromiumEngine {
    async fn open_page(&self) -> Result<Box<dyn PageHandle>> {
        let browser = self.browser.lock().await;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| SiftError::Pool(format!("failed to open page: {}", e)))?;
        Ok(Box::new(ChromiumPage { page }))
    }

    async fn shutdown(&self) -> Result<()> {
        let mut browser = self.browser.lock().await;
        browser
            .close()
            .await
            .map_err(|e| SiftError::Pool(format!("failed to close browser: {}", e)))?;
        self.event_loop.abort();
        debug!("chromium shut down");
        Ok(())
    }
}

/// One Chromium tab, exclusively owned by a single task.
struct ChromiumPage {
    page: Page,
}

#[async_trait]
impl PageHandle for ChromiumPage {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.page.goto(url).await.map_err(|e| SiftError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        // Waits for the navigation to finish and hands back the response,
        // so a served error page is reported instead of being counted.
        let request = self
            .page
            .wait_for_navigation_response()
            .await
            .map_err(|e| SiftError::Navigation { url: url.to_string(), reason: e.to_string() })?;

        if let Some(request) = request
            && let Some(response) = request.response.as_ref()
            && response.status >= 400
        {
            return Err(SiftError::Navigation {
                url: url.to_string(),
                reason: format!("HTTP status {}", response.status),
            });
        }

        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        let evaluation = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| SiftError::Render(format!("script evaluation failed: {}", e)))?;

        evaluation
            .into_value::<serde_json::Value>()
            .map_err(|e| SiftError::Render(format!("script returned a non-JSON value: {}", e)))
    }

    async fn html(&self) -> Result<String> {
        self.page
            .content()
            .await
            .map_err(|e| SiftError::Render(format!("failed to serialize DOM: {}", e)))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.page.close().await.map_err(|e| {
            warn!("failed to close page cleanly: {}", e);
            SiftError::Pool(format!("failed to close page: {}", e))
        })
    }
}

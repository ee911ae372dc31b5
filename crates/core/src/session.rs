//! Scoped acquisition of rendered pages.
//!
//! [`with_rendered_page`] is the only way tasks touch a page: it checks a
//! page out of the pool, navigates, hands the rendered page to the caller's
//! closure, and guarantees the page is returned to the pool on every exit
//! path (success, navigation failure, timeout, or an error inside the
//! closure). It never retries; retry policy belongs to the orchestrator,
//! which keeps per-task latency a single bounded attempt.

use std::time::Duration;

use futures::future::BoxFuture;
use tracing::debug;

use crate::engine::PageHandle;
use crate::pool::BrowserPool;
use crate::{Result, SiftError};

/// Configuration for one rendering session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Hard timeout for navigation, covering the network wait and the
    /// settle delay (default: 30s).
    pub nav_timeout: Duration,
    /// Extra delay after the load state is reached, so late script-driven
    /// DOM mutations have settled before extraction (default: 500ms).
    pub settle: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { nav_timeout: Duration::from_secs(30), settle: Duration::from_millis(500) }
    }
}

/// Check out a page, render `url` in it, and run `work` against the
/// rendered page.
///
/// The page is closed and its pool slot freed before this function returns,
/// regardless of the outcome. Navigation failures surface as
/// [`SiftError::Navigation`]; they do not corrupt the pool.
///
/// # Example
///
/// ```rust,no_run
/// use futures::FutureExt;
/// use pagesift_core::{BrowserPool, PoolConfig, SessionConfig, with_rendered_page};
///
/// # async fn example() -> pagesift_core::Result<()> {
/// let pool = BrowserPool::launch(&PoolConfig::default()).await?;
/// let html = with_rendered_page(&pool, "https://example.com", &SessionConfig::default(), |page| {
///     async move { page.html().await }.boxed()
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn with_rendered_page<T, F>(
    pool: &BrowserPool, url: &str, config: &SessionConfig, work: F,
) -> Result<T>
where
    F: for<'a> FnOnce(&'a dyn PageHandle) -> BoxFuture<'a, Result<T>> + Send,
{
    let lease = pool.checkout().await?;
    let outcome = drive(lease.page(), url, config, work).await;
    lease.release().await;
    outcome
}

/// Navigate and run the caller's work against the rendered page.
///
/// Split out from [`with_rendered_page`] so every early return still flows
/// through the single release above.
async fn drive<T, F>(page: &dyn PageHandle, url: &str, config: &SessionConfig, work: F) -> Result<T>
where
    F: for<'a> FnOnce(&'a dyn PageHandle) -> BoxFuture<'a, Result<T>> + Send,
{
    let rendered = async {
        page.navigate(url).await?;
        if !config.settle.is_zero() {
            tokio::time::sleep(config.settle).await;
        }
        Ok(())
    };

    match tokio::time::timeout(config.nav_timeout, rendered).await {
        Ok(Ok(())) => debug!(url, "page rendered"),
        Ok(Err(e)) => return Err(e),
        Err(_) => {
            return Err(SiftError::Navigation {
                url: url.to_string(),
                reason: format!("navigation timed out after {}s", config.nav_timeout.as_secs()),
            });
        }
    }

    work(page).await
}

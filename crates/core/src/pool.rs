//! Process-wide browser pool with bounded page checkout.
//!
//! One engine instance serves the whole batch. Pages are checked out per
//! task and returned on completion; a [`tokio::sync::Semaphore`] caps how
//! many pages are live at once, so peak browser resource usage stays
//! bounded no matter how large the batch is.
//!
//! The pool is initialized once before a batch starts and torn down once
//! after it finishes. A checked-out page is exclusively owned by one worker
//! through its [`PageLease`]; the pool itself is safe for concurrent
//! checkout and return.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};

use crate::engine::{BrowserEngine, PageHandle};
use crate::{Result, SiftError};

/// Configuration for launching the browser pool.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of pages checked out at any instant (default: 4).
    pub max_pages: usize,
    /// Explicit browser executable to launch instead of the discovered one.
    pub chrome_executable: Option<PathBuf>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { max_pages: 4, chrome_executable: None }
    }
}

/// A shared pool of page contexts backed by one browser engine.
pub struct BrowserPool {
    engine: Arc<dyn BrowserEngine>,
    permits: Arc<Semaphore>,
}

impl BrowserPool {
    /// Launch a Chromium-backed pool.
    ///
    /// Fails with [`SiftError::Pool`] if the browser cannot be started;
    /// that failure is fatal to any batch that would have used the pool.
    #[cfg(feature = "chromium")]
    pub async fn launch(config: &PoolConfig) -> Result<Self> {
        let engine = crate::chromium::ChromiumEngine::launch(config).await?;
        Ok(Self::with_engine(Arc::new(engine), config.max_pages))
    }

    /// Build a pool around an already-running engine.
    ///
    /// This is the seam tests use to substitute a stub engine for Chromium.
    pub fn with_engine(engine: Arc<dyn BrowserEngine>, max_pages: usize) -> Self {
        Self { engine, permits: Arc::new(Semaphore::new(max_pages.max(1))) }
    }

    /// Check out a fresh page context.
    ///
    /// Waits until a page slot is free, then opens an isolated page in the
    /// engine. The returned lease must be released via
    /// [`PageLease::release`] when the task is done with it.
    pub async fn checkout(&self) -> Result<PageLease> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| SiftError::Pool("pool has been shut down".to_string()))?;

        let page = self.engine.open_page().await?;
        debug!("page checked out");

        Ok(PageLease { page: Some(page), _permit: permit })
    }

    /// Shut the pool down: no further checkouts succeed, and the engine's
    /// browser process is terminated.
    pub async fn shutdown(&self) -> Result<()> {
        self.permits.close();
        self.engine.shutdown().await
    }
}

/// Exclusive ownership of one checked-out page.
///
/// The lease holds the page handle together with the pool permit that
/// reserved its slot; releasing it closes the page and frees the slot in
/// one step.
pub struct PageLease {
    page: Option<Box<dyn PageHandle>>,
    _permit: OwnedSemaphorePermit,
}

impl PageLease {
    /// Borrow the leased page.
    pub fn page(&self) -> &dyn PageHandle {
        // The handle is taken only by release(), which consumes the lease.
        self.page.as_deref().expect("page lease already released")
    }

    /// Close the page and return its slot to the pool.
    ///
    /// A failed close is logged rather than propagated: the task's own
    /// outcome has already been decided by the time the page is returned,
    /// and the permit is freed either way.
    pub async fn release(mut self) {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                warn!("failed to return page to pool: {}", e);
            } else {
                debug!("page returned to pool");
            }
        }
    }
}

impl Drop for PageLease {
    fn drop(&mut self) {
        // Closing requires an await, so all exit paths are expected to call
        // release(); a lease dropped with its page still attached means a
        // browser tab lingers until engine shutdown.
        if self.page.is_some() {
            warn!("page lease dropped without release; tab will linger until shutdown");
        }
    }
}

//! The rendering-engine seam.
//!
//! The pipeline needs exactly five capabilities from a browser engine:
//! launch/shutdown, open/close of an isolated page context, navigate and
//! wait for the load state, read-only script evaluation with a typed JSON
//! result, and serialization of the live DOM to HTML. Those capabilities
//! are the [`BrowserEngine`] / [`PageHandle`] trait pair; any engine
//! implementing them can sit behind the [`BrowserPool`](crate::BrowserPool).
//!
//! The default implementation drives Chromium over CDP (see the `chromium`
//! module); tests substitute an in-memory stub.

use async_trait::async_trait;

use crate::Result;

/// A launched browser engine that can open isolated page contexts.
///
/// Implementations must be safe to share across workers: `open_page` and
/// `shutdown` are called concurrently from the pool.
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    /// Open a fresh, isolated page context.
    ///
    /// The returned handle is exclusively owned by one task until it is
    /// closed. Failures here are pool failures: without a page context no
    /// task can proceed.
    async fn open_page(&self) -> Result<Box<dyn PageHandle>>;

    /// Shut the engine down, terminating the underlying browser process.
    async fn shutdown(&self) -> Result<()>;
}

/// An open page context inside a [`BrowserEngine`].
///
/// A handle is owned by exactly one task at a time and must be closed via
/// [`PageHandle::close`] before the owning worker moves on.
#[async_trait]
pub trait PageHandle: Send + Sync {
    /// Navigate to `url` and wait until the page's load state is reached.
    ///
    /// Transport failures, DNS errors, and non-success HTTP statuses all
    /// surface as [`SiftError::Navigation`](crate::SiftError::Navigation).
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Evaluate a read-only script against the live DOM.
    ///
    /// The script's result must be JSON-serializable; callers deserialize
    /// the returned value into their own typed shape. A failed evaluation
    /// surfaces as [`SiftError::Render`](crate::SiftError::Render).
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value>;

    /// Serialize the current, post-render DOM to an HTML string.
    async fn html(&self) -> Result<String>;

    /// Close the page context, releasing its resources in the engine.
    async fn close(self: Box<Self>) -> Result<()>;
}

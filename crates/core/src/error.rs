//! Error types for pagesift operations.
//!
//! This module defines the main error type [`SiftError`] which represents
//! all possible errors that can occur while rendering pages, extracting
//! text, and orchestrating batch analysis.
//!
//! # Example
//!
//! ```rust
//! use pagesift_core::{SiftError, Result};
//!
//! fn check_batch(urls: &[String]) -> Result<()> {
//!     if urls.is_empty() {
//!         return Err(SiftError::Validation("at least one URL is required".into()));
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Main error type for page analysis operations.
///
/// The variants map onto the two propagation scopes the pipeline
/// distinguishes: task-scoped failures ([`SiftError::Navigation`] and
/// [`SiftError::Render`]) are caught at the task boundary and reported as
/// per-URL errors, while [`SiftError::Validation`] and [`SiftError::Pool`]
/// fail the whole batch.
#[derive(Error, Debug)]
pub enum SiftError {
    /// Malformed batch input.
    ///
    /// Returned before any work starts: an empty URL list, or a
    /// zero concurrency limit.
    #[error("invalid batch input: {0}")]
    Validation(String),

    /// A URL could not be loaded.
    ///
    /// Covers DNS failures, connection errors, navigation timeouts, and
    /// non-success HTTP statuses. Scoped to a single task.
    #[error("failed to load {url}: {reason}")]
    Navigation { url: String, reason: String },

    /// The page handle became unusable after a successful navigation.
    ///
    /// Typically a failed in-page script evaluation or a malformed
    /// snapshot returned by the engine. Scoped to a single task.
    #[error("page became unusable: {0}")]
    Render(String),

    /// The browser engine could not be launched, or a checkout/return
    /// operation failed irrecoverably.
    ///
    /// Fatal to the whole batch: no task can proceed without the pool.
    #[error("browser pool failure: {0}")]
    Pool(String),
}

impl SiftError {
    /// Whether this error is scoped to a single task.
    ///
    /// Task-scoped errors become [`ErrorInfo`](crate::ErrorInfo) entries in
    /// the result list; everything else propagates to the orchestrator's
    /// caller.
    pub fn is_task_scoped(&self) -> bool {
        matches!(self, SiftError::Navigation { .. } | SiftError::Render(_))
    }
}

/// Result type alias for SiftError.
pub type Result<T> = std::result::Result<T, SiftError>;

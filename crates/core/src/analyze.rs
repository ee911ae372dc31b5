//! Batch orchestration: fan URLs out to bounded workers and assemble
//! results in input order.
//!
//! Workers pull indices from a shared cursor over the input list, so at
//! most `concurrency` pages are being rendered at once no matter how large
//! the batch is. Each task runs the full pipeline (render, visible-text
//! extraction, classification, word counting), and any task-scoped failure
//! is converted into an [`ErrorInfo`] entry for that URL alone. Results
//! land in slots addressed by input position, so the output order never
//! depends on completion order.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::FutureExt;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::classify::{ClassifyConfig, classify_html};
use crate::pool::BrowserPool;
use crate::session::{SessionConfig, with_rendered_page};
use crate::visible::extract_visible_text;
use crate::words::{count_words, count_words_opt};
use crate::{Result, SiftError};

/// Configuration for batch analysis.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Maximum number of URLs analyzed concurrently (default: 4).
    pub concurrency: usize,
    /// Extra attempts after a navigation failure (default: 0). Render
    /// failures are never retried.
    pub nav_retries: usize,
    /// Overall deadline for the batch. When it passes, pending tasks are
    /// reported as timeouts and completed results are returned as-is.
    pub batch_timeout: Option<Duration>,
    /// Per-session rendering configuration.
    pub session: SessionConfig,
    /// Content classification configuration.
    pub classify: ClassifyConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            nav_retries: 0,
            batch_timeout: None,
            session: SessionConfig::default(),
            classify: ClassifyConfig::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Creates a new builder for AnalyzerConfig.
    pub fn builder() -> AnalyzerConfigBuilder {
        AnalyzerConfigBuilder::new()
    }
}

/// Builder for [`AnalyzerConfig`].
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use pagesift_core::AnalyzerConfig;
///
/// let config = AnalyzerConfig::builder()
///     .concurrency(8)
///     .nav_retries(1)
///     .batch_timeout(Duration::from_secs(120))
///     .build();
/// assert_eq!(config.concurrency, 8);
/// ```
pub struct AnalyzerConfigBuilder {
    config: AnalyzerConfig,
}

impl AnalyzerConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: AnalyzerConfig::default() }
    }

    /// Sets the worker concurrency limit.
    pub fn concurrency(mut self, value: usize) -> Self {
        self.config.concurrency = value;
        self
    }

    /// Sets the number of extra navigation attempts per task.
    pub fn nav_retries(mut self, value: usize) -> Self {
        self.config.nav_retries = value;
        self
    }

    /// Sets the overall batch deadline.
    pub fn batch_timeout(mut self, value: Duration) -> Self {
        self.config.batch_timeout = Some(value);
        self
    }

    /// Sets the per-session rendering configuration.
    pub fn session(mut self, value: SessionConfig) -> Self {
        self.config.session = value;
        self
    }

    /// Sets the classification configuration.
    pub fn classify(mut self, value: ClassifyConfig) -> Self {
        self.config.classify = value;
        self
    }

    /// Builds the config.
    pub fn build(self) -> AnalyzerConfig {
        self.config
    }
}

impl Default for AnalyzerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle state of one unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Rendering,
    Extracting,
    Done,
    Failed,
}

/// One unit of work: the analysis of exactly one URL.
///
/// Owned and mutated only by the worker executing it; the terminal state
/// is set exactly once.
#[derive(Debug)]
pub struct UrlTask {
    url: String,
    state: TaskState,
}

impl UrlTask {
    fn new(url: &str) -> Self {
        Self { url: url.to_string(), state: TaskState::Pending }
    }

    /// The URL this task analyzes.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The task's current lifecycle state.
    pub fn state(&self) -> TaskState {
        self.state
    }

    fn advance(&mut self, state: TaskState) {
        debug_assert!(
            !matches!(self.state, TaskState::Done | TaskState::Failed),
            "terminal task state must not be revisited"
        );
        debug!(url = %self.url, ?state, "task state");
        self.state = state;
    }
}

/// Successful analysis of one URL.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Words a visitor can see anywhere on the page.
    pub total_readable_word_count: usize,
    /// Words inside the detected main-content block (including the title).
    pub main_content_word_count: usize,
}

/// Failed analysis of one URL. Never aborts sibling tasks.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorInfo {
    pub url: String,
    pub error: String,
}

/// Per-URL outcome: either a result or an error entry.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PageReport {
    Ok(AnalysisResult),
    Err(ErrorInfo),
}

impl PageReport {
    /// The URL this report belongs to.
    pub fn url(&self) -> &str {
        match self {
            PageReport::Ok(result) => &result.url,
            PageReport::Err(info) => &info.url,
        }
    }

    /// Whether the URL was analyzed successfully.
    pub fn is_ok(&self) -> bool {
        matches!(self, PageReport::Ok(_))
    }
}

/// Analyze a batch of URLs against a shared browser pool.
///
/// Returns one [`PageReport`] per input URL, in input order. Individual
/// navigation or extraction failures become [`ErrorInfo`] entries; only a
/// malformed batch ([`SiftError::Validation`]) or a dead pool
/// ([`SiftError::Pool`]) fails the call as a whole.
pub async fn analyze(
    urls: &[String], pool: Arc<BrowserPool>, config: &AnalyzerConfig,
) -> Result<Vec<PageReport>> {
    if urls.is_empty() {
        return Err(SiftError::Validation("urls must be a non-empty list".to_string()));
    }
    if config.concurrency == 0 {
        return Err(SiftError::Validation("concurrency must be greater than zero".to_string()));
    }

    let total = urls.len();
    let workers = config.concurrency.min(total);
    info!(total, workers, "starting batch analysis");

    let urls = Arc::new(urls.to_vec());
    let cursor = Arc::new(AtomicUsize::new(0));
    let (report_tx, mut report_rx) = mpsc::channel::<(usize, Result<PageReport>)>(total);
    let (stop_tx, stop_rx) = watch::channel(false);

    for _ in 0..workers {
        let urls = Arc::clone(&urls);
        let cursor = Arc::clone(&cursor);
        let pool = Arc::clone(&pool);
        let config = config.clone();
        let report_tx = report_tx.clone();
        let stop_rx = stop_rx.clone();

        tokio::spawn(async move {
            loop {
                if *stop_rx.borrow() {
                    break;
                }
                let index = cursor.fetch_add(1, Ordering::SeqCst);
                if index >= urls.len() {
                    break;
                }
                let report = run_task(&pool, &urls[index], &config).await;
                if report_tx.send((index, report)).await.is_err() {
                    break;
                }
            }
        });
    }
    drop(report_tx);

    let mut slots: Vec<Option<PageReport>> = vec![None; total];
    let mut fatal: Option<SiftError> = None;

    let deadline = config.batch_timeout.map(|t| tokio::time::Instant::now() + t);
    loop {
        let received = match deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, report_rx.recv()).await {
                Ok(received) => received,
                Err(_) => {
                    warn!("batch deadline passed; reporting pending tasks as timed out");
                    let _ = stop_tx.send(true);
                    break;
                }
            },
            None => report_rx.recv().await,
        };

        match received {
            Some((index, Ok(report))) => slots[index] = Some(report),
            Some((index, Err(error))) => {
                warn!(url = %urls[index], %error, "fatal error during batch");
                let _ = stop_tx.send(true);
                fatal.get_or_insert(error);
            }
            None => break,
        }
    }

    if let Some(error) = fatal {
        return Err(error);
    }

    let reports = urls
        .iter()
        .zip(slots)
        .map(|(url, slot)| {
            slot.unwrap_or_else(|| {
                PageReport::Err(ErrorInfo {
                    url: url.clone(),
                    error: "analysis did not finish before the batch deadline".to_string(),
                })
            })
        })
        .collect();

    Ok(reports)
}

/// Run one task and fold its outcome into a report.
///
/// Task-scoped errors become [`ErrorInfo`] entries; validation and pool
/// errors bubble up to fail the batch.
async fn run_task(pool: &BrowserPool, url: &str, config: &AnalyzerConfig) -> Result<PageReport> {
    let mut task = UrlTask::new(url);

    match analyze_url(pool, &mut task, config).await {
        Ok(result) => {
            task.advance(TaskState::Done);
            Ok(PageReport::Ok(result))
        }
        Err(error) if error.is_task_scoped() => {
            task.advance(TaskState::Failed);
            warn!(url, %error, "task failed");
            Ok(PageReport::Err(ErrorInfo { url: url.to_string(), error: error.to_string() }))
        }
        Err(error) => {
            task.advance(TaskState::Failed);
            Err(error)
        }
    }
}

/// The per-URL pipeline: render, snapshot, classify, count.
async fn analyze_url(
    pool: &BrowserPool, task: &mut UrlTask, config: &AnalyzerConfig,
) -> Result<AnalysisResult> {
    task.advance(TaskState::Rendering);
    let (visible, html) = render_and_snapshot(pool, task.url(), config).await?;

    task.advance(TaskState::Extracting);
    let content = classify_html(&html, &config.classify);

    let total_words = count_words(&visible);
    let content_words = count_words(&content.body_text) + count_words_opt(content.title.as_deref());
    // The classifier reads serialized HTML, so pathological markup could
    // push its count past the visible total; the invariant wins.
    if content_words > total_words {
        warn!(url = task.url(), content_words, total_words, "clamping main-content count to total");
    }

    Ok(AnalysisResult {
        url: task.url().to_string(),
        title: content.title,
        total_readable_word_count: total_words,
        main_content_word_count: content_words.min(total_words),
    })
}

/// Render the page and pull both raw materials out of the session scope:
/// the visible text and the serialized DOM. Navigation failures are
/// retried up to `nav_retries` extra attempts; anything else is final.
async fn render_and_snapshot(
    pool: &BrowserPool, url: &str, config: &AnalyzerConfig,
) -> Result<(String, String)> {
    let mut attempts = 0;
    loop {
        let outcome = with_rendered_page(pool, url, &config.session, |page| {
            async move {
                let visible = extract_visible_text(page).await?;
                let html = page.html().await?;
                Ok((visible, html))
            }
            .boxed()
        })
        .await;

        match outcome {
            Err(SiftError::Navigation { .. }) if attempts < config.nav_retries => {
                attempts += 1;
                debug!(url, attempts, "retrying navigation");
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{BrowserEngine, PageHandle};
    use async_trait::async_trait;

    struct NoopEngine;

    #[async_trait]
    impl BrowserEngine for NoopEngine {
        async fn open_page(&self) -> Result<Box<dyn PageHandle>> {
            Err(SiftError::Pool("no pages in the noop engine".to_string()))
        }

        async fn shutdown(&self) -> Result<()> {
            Ok(())
        }
    }

    fn noop_pool() -> Arc<BrowserPool> {
        Arc::new(BrowserPool::with_engine(Arc::new(NoopEngine), 1))
    }

    #[tokio::test]
    async fn test_empty_batch_rejected_before_pool_use() {
        let result = analyze(&[], noop_pool(), &AnalyzerConfig::default()).await;
        assert!(matches!(result, Err(SiftError::Validation(_))));
    }

    #[tokio::test]
    async fn test_zero_concurrency_rejected() {
        let config = AnalyzerConfig::builder().concurrency(0).build();
        let urls = vec!["https://example.com".to_string()];
        let result = analyze(&urls, noop_pool(), &config).await;
        assert!(matches!(result, Err(SiftError::Validation(_))));
    }

    #[tokio::test]
    async fn test_pool_failure_is_fatal() {
        let urls = vec!["https://example.com".to_string()];
        let result = analyze(&urls, noop_pool(), &AnalyzerConfig::default()).await;
        assert!(matches!(result, Err(SiftError::Pool(_))));
    }

    #[test]
    fn test_builder_round_trip() {
        let config = AnalyzerConfig::builder()
            .concurrency(9)
            .nav_retries(2)
            .batch_timeout(Duration::from_secs(10))
            .build();

        assert_eq!(config.concurrency, 9);
        assert_eq!(config.nav_retries, 2);
        assert_eq!(config.batch_timeout, Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_report_serialization_shapes() {
        let ok = PageReport::Ok(AnalysisResult {
            url: "https://example.com".to_string(),
            title: Some("Example".to_string()),
            total_readable_word_count: 500,
            main_content_word_count: 450,
        });
        let err = PageReport::Err(ErrorInfo {
            url: "https://bad.invalid".to_string(),
            error: "failed to load".to_string(),
        });

        let ok_json = serde_json::to_value(&ok).unwrap();
        assert_eq!(ok_json["totalReadableWordCount"], 500);
        assert_eq!(ok_json["mainContentWordCount"], 450);

        let err_json = serde_json::to_value(&err).unwrap();
        assert_eq!(err_json["error"], "failed to load");
        assert!(err_json.get("totalReadableWordCount").is_none());
    }

    #[test]
    fn test_task_state_transitions() {
        let mut task = UrlTask::new("https://example.com");
        assert_eq!(task.state(), TaskState::Pending);
        task.advance(TaskState::Rendering);
        task.advance(TaskState::Extracting);
        task.advance(TaskState::Done);
        assert_eq!(task.state(), TaskState::Done);
    }
}

//! End-to-end pipeline tests over an in-memory scripted engine.
//!
//! Every property here runs without a browser: the engine seam is swapped
//! for fixtures that serve canned snapshots and HTML, fail or stall
//! navigation on demand, and count page checkouts.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use pagesift_core::{
    AnalyzerConfig, BrowserEngine, BrowserPool, PageHandle, PageReport, Result, SessionConfig, SiftError,
    analyze, extract_main_content,
};
use serde_json::{Value, json};

#[derive(Clone)]
enum Fixture {
    /// Renders successfully with the given snapshot and serialized DOM.
    Page { snapshot: Value, html: String },
    /// Navigation fails immediately.
    FailNavigation,
    /// Navigation sleeps before succeeding.
    SlowNavigation { delay: Duration, snapshot: Value, html: String },
    /// Navigation succeeds, script evaluation fails.
    FailEvaluation,
    /// Navigation fails until the counter runs out, then succeeds.
    FlakyNavigation { remaining_failures: Arc<AtomicUsize>, snapshot: Value, html: String },
}

#[derive(Default)]
struct EngineStats {
    opened: AtomicUsize,
    closed: AtomicUsize,
    live: AtomicUsize,
    max_live: AtomicUsize,
}

struct ScriptedEngine {
    fixtures: Arc<HashMap<String, Fixture>>,
    stats: Arc<EngineStats>,
}

struct ScriptedPage {
    fixtures: Arc<HashMap<String, Fixture>>,
    rendered: Mutex<Option<Fixture>>,
    stats: Arc<EngineStats>,
}

#[async_trait]
impl BrowserEngine for ScriptedEngine {
    async fn open_page(&self) -> Result<Box<dyn PageHandle>> {
        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        let live = self.stats.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_live.fetch_max(live, Ordering::SeqCst);
        Ok(Box::new(ScriptedPage {
            fixtures: self.fixtures.clone(),
            rendered: Mutex::new(None),
            stats: self.stats.clone(),
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl PageHandle for ScriptedPage {
    async fn navigate(&self, url: &str) -> Result<()> {
        let fixture = self.fixtures.get(url).cloned().ok_or_else(|| SiftError::Navigation {
            url: url.to_string(),
            reason: "no fixture for this URL".to_string(),
        })?;

        match &fixture {
            Fixture::Page { .. } => {}
            Fixture::FailNavigation => {
                return Err(SiftError::Navigation {
                    url: url.to_string(),
                    reason: "connection refused".to_string(),
                });
            }
            Fixture::SlowNavigation { delay, .. } => tokio::time::sleep(*delay).await,
            Fixture::FailEvaluation => {}
            Fixture::FlakyNavigation { remaining_failures, .. } => {
                let remaining = remaining_failures.load(Ordering::SeqCst);
                if remaining > 0 {
                    remaining_failures.store(remaining - 1, Ordering::SeqCst);
                    return Err(SiftError::Navigation {
                        url: url.to_string(),
                        reason: "transient network error".to_string(),
                    });
                }
            }
        }

        *self.rendered.lock().unwrap() = Some(fixture);
        Ok(())
    }

    async fn evaluate(&self, _script: &str) -> Result<Value> {
        let rendered = self.rendered.lock().unwrap().clone();
        match rendered {
            Some(Fixture::Page { snapshot, .. })
            | Some(Fixture::SlowNavigation { snapshot, .. })
            | Some(Fixture::FlakyNavigation { snapshot, .. }) => Ok(snapshot),
            Some(Fixture::FailEvaluation) => {
                Err(SiftError::Render("script evaluation failed".to_string()))
            }
            _ => Err(SiftError::Render("page never rendered".to_string())),
        }
    }

    async fn html(&self) -> Result<String> {
        let rendered = self.rendered.lock().unwrap().clone();
        match rendered {
            Some(Fixture::Page { html, .. })
            | Some(Fixture::SlowNavigation { html, .. })
            | Some(Fixture::FlakyNavigation { html, .. }) => Ok(html),
            _ => Err(SiftError::Render("page never rendered".to_string())),
        }
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.stats.closed.fetch_add(1, Ordering::SeqCst);
        self.stats.live.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Snapshot of the article fixture: 3 heading words, 3 nav words, a
/// hidden banner, and a 13-word article paragraph. 19 visible words.
fn article_snapshot() -> Value {
    json!({
        "kind": "element", "tag": "body", "visible": true, "children": [
            { "kind": "element", "tag": "h1", "visible": true, "children": [
                { "kind": "text", "content": "Word Ratio Report" },
            ]},
            { "kind": "element", "tag": "nav", "visible": true, "children": [
                { "kind": "text", "content": "Home About Contact" },
            ]},
            { "kind": "element", "tag": "div", "visible": false, "children": [
                { "kind": "element", "tag": "p", "visible": true, "children": [
                    { "kind": "text", "content": "This banner is hidden and never counted" },
                ]},
            ]},
            { "kind": "element", "tag": "article", "visible": true, "children": [
                { "kind": "text", "content": "Rendering pages before counting words gives honest totals, because scripts assemble most text." },
            ]},
        ],
    })
}

fn article_html() -> String {
    r#"
    <html>
    <head><title>Word Ratio Report</title></head>
    <body>
        <h1>Word Ratio Report</h1>
        <nav class="menu"><a href="/">Home</a> <a href="/about">About</a> <a href="/contact">Contact</a></nav>
        <article class="post">
            <p>Rendering pages before counting words gives honest totals, because scripts assemble most text.</p>
        </article>
    </body>
    </html>
    "#
    .to_string()
}

fn article_fixture() -> Fixture {
    Fixture::Page { snapshot: article_snapshot(), html: article_html() }
}

fn scripted_pool(fixtures: HashMap<String, Fixture>, max_pages: usize) -> (Arc<BrowserPool>, Arc<EngineStats>) {
    let stats = Arc::new(EngineStats::default());
    let engine = ScriptedEngine { fixtures: Arc::new(fixtures), stats: stats.clone() };
    (Arc::new(BrowserPool::with_engine(Arc::new(engine), max_pages)), stats)
}

fn fast_config(concurrency: usize) -> AnalyzerConfig {
    AnalyzerConfig::builder()
        .concurrency(concurrency)
        .session(SessionConfig { nav_timeout: Duration::from_secs(5), settle: Duration::ZERO })
        .build()
}

#[tokio::test]
async fn test_single_page_word_counts() {
    let fixtures = HashMap::from([("https://example.com/report".to_string(), article_fixture())]);
    let (pool, stats) = scripted_pool(fixtures, 4);

    let urls = vec!["https://example.com/report".to_string()];
    let reports = analyze(&urls, pool, &fast_config(2)).await.unwrap();

    assert_eq!(reports.len(), 1);
    match &reports[0] {
        PageReport::Ok(result) => {
            assert_eq!(result.url, "https://example.com/report");
            assert_eq!(result.title.as_deref(), Some("Word Ratio Report"));
            // 3 heading + 3 nav + 13 article words; the hidden banner is
            // absent from the total.
            assert_eq!(result.total_readable_word_count, 19);
            // 13 article words + 3 title words.
            assert_eq!(result.main_content_word_count, 16);
        }
        PageReport::Err(info) => panic!("expected success, got error: {}", info.error),
    }

    assert_eq!(stats.opened.load(Ordering::SeqCst), 1);
    assert_eq!(stats.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_mixed_batch_preserves_order_and_isolates_failures() {
    let mut fixtures = HashMap::new();
    for i in 0..6 {
        let fixture = if i == 1 || i == 4 { Fixture::FailNavigation } else { article_fixture() };
        fixtures.insert(format!("https://site{}.example/", i), fixture);
    }
    let (pool, stats) = scripted_pool(fixtures, 8);

    let urls: Vec<String> = (0..6).map(|i| format!("https://site{}.example/", i)).collect();
    let reports = analyze(&urls, pool, &fast_config(3)).await.unwrap();

    assert_eq!(reports.len(), 6);
    for (i, report) in reports.iter().enumerate() {
        assert_eq!(report.url(), urls[i], "output order must match input order");
        if i == 1 || i == 4 {
            assert!(!report.is_ok(), "url {} should have failed", i);
        } else {
            assert!(report.is_ok(), "url {} should have succeeded", i);
        }
    }
    assert_eq!(reports.iter().filter(|r| !r.is_ok()).count(), 2);

    // Every checkout was returned exactly once, failures included.
    assert_eq!(stats.opened.load(Ordering::SeqCst), 6);
    assert_eq!(stats.closed.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn test_worker_bound_caps_live_pages() {
    let mut fixtures = HashMap::new();
    for i in 0..8 {
        fixtures.insert(
            format!("https://site{}.example/", i),
            Fixture::SlowNavigation {
                delay: Duration::from_millis(25),
                snapshot: article_snapshot(),
                html: article_html(),
            },
        );
    }
    let (pool, stats) = scripted_pool(fixtures, 16);

    let urls: Vec<String> = (0..8).map(|i| format!("https://site{}.example/", i)).collect();
    let reports = analyze(&urls, pool, &fast_config(3)).await.unwrap();

    assert_eq!(reports.len(), 8);
    assert!(reports.iter().all(PageReport::is_ok));
    assert!(
        stats.max_live.load(Ordering::SeqCst) <= 3,
        "no more than `concurrency` pages may be checked out at once"
    );
}

#[tokio::test]
async fn test_pool_cap_holds_even_with_more_workers() {
    let mut fixtures = HashMap::new();
    for i in 0..6 {
        fixtures.insert(
            format!("https://site{}.example/", i),
            Fixture::SlowNavigation {
                delay: Duration::from_millis(25),
                snapshot: article_snapshot(),
                html: article_html(),
            },
        );
    }
    let (pool, stats) = scripted_pool(fixtures, 2);

    let urls: Vec<String> = (0..6).map(|i| format!("https://site{}.example/", i)).collect();
    let reports = analyze(&urls, pool, &fast_config(6)).await.unwrap();

    assert_eq!(reports.len(), 6);
    assert!(stats.max_live.load(Ordering::SeqCst) <= 2, "the pool semaphore is its own cap");
}

#[tokio::test]
async fn test_render_failure_becomes_error_entry_and_releases_page() {
    let fixtures = HashMap::from([
        ("https://broken.example/".to_string(), Fixture::FailEvaluation),
        ("https://fine.example/".to_string(), article_fixture()),
    ]);
    let (pool, stats) = scripted_pool(fixtures, 4);

    let urls = vec!["https://broken.example/".to_string(), "https://fine.example/".to_string()];
    let reports = analyze(&urls, pool, &fast_config(2)).await.unwrap();

    match &reports[0] {
        PageReport::Err(info) => {
            assert_eq!(info.url, "https://broken.example/");
            assert!(info.error.contains("unusable"));
        }
        PageReport::Ok(_) => panic!("render failure should yield an error entry"),
    }
    assert!(reports[1].is_ok());
    assert_eq!(stats.opened.load(Ordering::SeqCst), stats.closed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_invariant_main_never_exceeds_total() {
    let fixtures = HashMap::from([("https://example.com/report".to_string(), article_fixture())]);
    let (pool, _stats) = scripted_pool(fixtures, 4);

    let urls = vec!["https://example.com/report".to_string()];
    let reports = analyze(&urls, pool, &fast_config(1)).await.unwrap();

    if let PageReport::Ok(result) = &reports[0] {
        assert!(result.main_content_word_count <= result.total_readable_word_count);
    } else {
        panic!("expected success");
    }
}

#[tokio::test]
async fn test_navigation_retry_recovers_transient_failures() {
    let remaining = Arc::new(AtomicUsize::new(1));
    let fixtures = HashMap::from([(
        "https://flaky.example/".to_string(),
        Fixture::FlakyNavigation {
            remaining_failures: remaining.clone(),
            snapshot: article_snapshot(),
            html: article_html(),
        },
    )]);
    let (pool, stats) = scripted_pool(fixtures, 4);

    let config = AnalyzerConfig::builder()
        .concurrency(1)
        .nav_retries(1)
        .session(SessionConfig { nav_timeout: Duration::from_secs(5), settle: Duration::ZERO })
        .build();

    let urls = vec!["https://flaky.example/".to_string()];
    let reports = analyze(&urls, pool, &config).await.unwrap();

    assert!(reports[0].is_ok(), "one retry should recover a single transient failure");
    // Two attempts means two checkouts, each returned.
    assert_eq!(stats.opened.load(Ordering::SeqCst), 2);
    assert_eq!(stats.closed.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_no_retries_by_default() {
    let remaining = Arc::new(AtomicUsize::new(1));
    let fixtures = HashMap::from([(
        "https://flaky.example/".to_string(),
        Fixture::FlakyNavigation {
            remaining_failures: remaining,
            snapshot: article_snapshot(),
            html: article_html(),
        },
    )]);
    let (pool, _stats) = scripted_pool(fixtures, 4);

    let urls = vec!["https://flaky.example/".to_string()];
    let reports = analyze(&urls, pool, &fast_config(1)).await.unwrap();

    assert!(!reports[0].is_ok(), "without retries a transient failure is final");
}

#[tokio::test]
async fn test_batch_timeout_returns_partial_results() {
    let fixtures = HashMap::from([
        ("https://fast.example/".to_string(), article_fixture()),
        (
            "https://stuck.example/".to_string(),
            Fixture::SlowNavigation {
                delay: Duration::from_secs(30),
                snapshot: article_snapshot(),
                html: article_html(),
            },
        ),
    ]);
    let (pool, _stats) = scripted_pool(fixtures, 4);

    let config = AnalyzerConfig::builder()
        .concurrency(2)
        .batch_timeout(Duration::from_millis(300))
        .session(SessionConfig { nav_timeout: Duration::from_secs(60), settle: Duration::ZERO })
        .build();

    let urls = vec!["https://fast.example/".to_string(), "https://stuck.example/".to_string()];
    let reports = analyze(&urls, pool, &config).await.unwrap();

    assert_eq!(reports.len(), 2);
    assert!(reports[0].is_ok(), "the fast page finishes before the deadline");
    match &reports[1] {
        PageReport::Err(info) => assert!(info.error.contains("deadline")),
        PageReport::Ok(_) => panic!("the stuck page should be reported as timed out"),
    }
}

#[tokio::test]
async fn test_extract_main_content_contract() {
    let fixtures = HashMap::from([("https://example.com/report".to_string(), article_fixture())]);
    let (pool, _stats) = scripted_pool(fixtures, 2);

    let content = pagesift_core::with_rendered_page(
        &pool,
        "https://example.com/report",
        &SessionConfig { nav_timeout: Duration::from_secs(5), settle: Duration::ZERO },
        |page| {
            async move { extract_main_content(page, &pagesift_core::ClassifyConfig::default()).await }.boxed()
        },
    )
    .await
    .unwrap();

    assert_eq!(content.title.as_deref(), Some("Word Ratio Report"));
    assert!(content.body_text.contains("honest totals"));
}

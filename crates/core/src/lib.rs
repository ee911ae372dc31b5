pub mod analyze;
#[cfg(feature = "chromium")]
pub mod chromium;
pub mod classify;
pub mod engine;
pub mod error;
pub mod pool;
pub mod sanitize;
pub mod score;
pub mod session;
pub mod visible;
pub mod words;

pub use analyze::{
    AnalysisResult, AnalyzerConfig, AnalyzerConfigBuilder, ErrorInfo, PageReport, TaskState, UrlTask, analyze,
};
#[cfg(feature = "chromium")]
pub use chromium::ChromiumEngine;
pub use classify::{ClassifyConfig, MainContent, classify_html, extract_main_content};
pub use engine::{BrowserEngine, PageHandle};
pub use error::{Result, SiftError};
pub use pool::{BrowserPool, PageLease, PoolConfig};
pub use sanitize::sanitize_html;
#[doc(hidden)]
pub use score::{ElementScore, ScoreConfig, Scorer, base_tag_score, collapsed_text};
pub use session::{SessionConfig, with_rendered_page};
pub use visible::{PageNode, SNAPSHOT_SCRIPT, extract_visible_text, parse_snapshot, visible_text};
pub use words::{count_words, count_words_opt};

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use pagesift_core::{
    AnalyzerConfig, BrowserPool, PageReport, PoolConfig, SessionConfig, analyze,
};

mod echo;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for analysis results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Table,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid format: {}. Valid options: table, json", s)),
        }
    }
}

/// Measure visible text and main-content text on rendered web pages
#[derive(Parser, Debug)]
#[command(name = "pagesift")]
#[command(author = "Pagesift Contributors")]
#[command(version = VERSION)]
#[command(about = "Measure visible and main-content words on rendered web pages", long_about = None)]
struct Args {
    /// URLs to analyze
    #[arg(value_name = "URL", required = true)]
    urls: Vec<String>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", value_name = "FORMAT")]
    format: OutputFormat,

    /// Maximum number of pages analyzed concurrently
    #[arg(short, long, default_value = "4", value_name = "NUM")]
    concurrency: usize,

    /// Per-page navigation timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    nav_timeout: u64,

    /// Overall batch deadline in seconds (unset: no deadline)
    #[arg(long, value_name = "SECS")]
    batch_timeout: Option<u64>,

    /// Extra navigation attempts per page after a failure
    #[arg(long, default_value = "0", value_name = "NUM")]
    retries: usize,

    /// Explicit browser executable to launch
    #[arg(long, value_name = "PATH")]
    chrome: Option<PathBuf>,

    /// Enable progress output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.verbose {
        echo::print_banner();
    }

    for url in &args.urls {
        url::Url::parse(url).with_context(|| format!("Invalid URL: {}", url))?;
    }

    if args.verbose {
        echo::print_step(1, 3, &format!("Launching browser pool ({} pages max)", args.concurrency));
    }

    let pool_config = PoolConfig { max_pages: args.concurrency, chrome_executable: args.chrome.clone() };
    let pool = Arc::new(
        BrowserPool::launch(&pool_config)
            .await
            .context("Failed to launch the browser")?,
    );

    if args.verbose {
        echo::print_step(2, 3, &format!("Analyzing {} page(s)", args.urls.len()));
    }

    let mut builder = AnalyzerConfig::builder()
        .concurrency(args.concurrency)
        .nav_retries(args.retries)
        .session(SessionConfig {
            nav_timeout: Duration::from_secs(args.nav_timeout),
            ..Default::default()
        });
    if let Some(secs) = args.batch_timeout {
        builder = builder.batch_timeout(Duration::from_secs(secs));
    }
    let config = builder.build();

    let outcome = analyze(&args.urls, Arc::clone(&pool), &config).await;

    // The pool is torn down before the outcome is inspected, so a failed
    // batch never leaves a browser process behind.
    if let Err(e) = pool.shutdown().await {
        echo::print_error(&format!("Browser shutdown failed: {}", e));
    }

    let reports = outcome.context("Failed to analyze the requested URLs")?;

    if args.verbose {
        echo::print_step(3, 3, "Writing results");
        eprintln!();
    }

    match args.format {
        OutputFormat::Json => {
            let body = serde_json::json!({ "results": reports });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Table => {
            echo::print_table_header();
            for report in &reports {
                match report {
                    PageReport::Ok(result) => echo::print_table_row(
                        &result.url,
                        result.total_readable_word_count,
                        result.main_content_word_count,
                    ),
                    PageReport::Err(info) => echo::print_table_error(&info.url, &info.error),
                }
            }
        }
    }

    let failures = reports.iter().filter(|r| !r.is_ok()).count();
    if args.verbose {
        if failures == 0 {
            echo::print_success(&format!("Analyzed {} page(s)", reports.len()));
        } else {
            echo::print_info(&format!("Analyzed {} page(s), {} failed", reports.len(), failures));
        }
    }

    Ok(())
}

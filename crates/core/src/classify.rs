//! Content-vs-boilerplate classification.
//!
//! Approximates the subset of a page's text that is the primary article
//! content, discarding navigation, sidebars, headers, footers, and other
//! repeated chrome. The approach is a content-density heuristic, not a
//! selector blacklist: every candidate element is scored by tag, class/ID
//! hints, prose density, and link density; paragraph scores propagate to
//! their ancestors; the highest-scoring candidate (plus qualifying
//! siblings) is taken as the article block.
//!
//! The classifier reads the serialized post-render HTML, so it sees the
//! DOM as client-side scripts left it. Malformed markup never fails; the
//! worst case is the empty result.

use std::collections::HashMap;

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};

use crate::engine::PageHandle;
use crate::sanitize::sanitize_html;
use crate::score::{ScoreConfig, Scorer, collapsed_text};
use crate::Result;

/// Configuration for content classification.
#[derive(Debug, Clone)]
pub struct ClassifyConfig {
    /// Minimum score for a candidate to qualify as main content
    /// (default: 20.0). Below this, the page is treated as having no
    /// article block at all.
    pub min_score: f64,
    /// Minimum collapsed text length for a paragraph-level candidate
    /// (default: 50). Container tags are always considered.
    pub char_threshold: usize,
    /// A sibling of the top candidate is included when its score is at
    /// least this fraction of the top score (default: 0.2).
    pub sibling_ratio: f64,
    /// Number of top candidates kept for sibling selection (default: 5).
    pub max_candidates: usize,
    /// Element scoring parameters.
    pub score: ScoreConfig,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            min_score: 20.0,
            char_threshold: 50,
            sibling_ratio: 0.2,
            max_candidates: 5,
            score: ScoreConfig::default(),
        }
    }
}

/// The classified main content of a page.
///
/// Both fields are empty when no candidate block qualifies. That is a
/// valid outcome (downstream word counts become zero), not an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MainContent {
    /// The page title, when one exists and content was found.
    pub title: Option<String>,
    /// Collapsed text of the selected content block and its qualifying
    /// siblings, in document order.
    pub body_text: String,
}

/// Tags considered as potential content containers.
const CANDIDATE_SELECTOR: &str = "article, main, section, div, p, td, pre, blockquote";

/// A scored candidate element.
struct Candidate<'a> {
    element: ElementRef<'a>,
    score: f64,
}

/// Classify the main content of a rendered page.
///
/// This is the page-level contract: serialize the live DOM, then run
/// [`classify_html`] over it.
pub async fn extract_main_content(page: &dyn PageHandle, config: &ClassifyConfig) -> Result<MainContent> {
    let html = page.html().await?;
    Ok(classify_html(&html, config))
}

/// Classify the main content of a serialized HTML document.
///
/// Never fails: unparseable or content-free documents yield the empty
/// [`MainContent`].
pub fn classify_html(html: &str, config: &ClassifyConfig) -> MainContent {
    let clean = sanitize_html(html);
    let doc = Html::parse_document(&clean);
    let scorer = Scorer::new(config.score.clone());

    let candidates = rank_candidates(&doc, &scorer, config);

    let Some(top) = candidates.first() else {
        return MainContent::default();
    };
    if top.score < config.min_score {
        return MainContent::default();
    }

    let body_text = assemble_block_text(top, &candidates, config);

    MainContent { title: page_title(&doc), body_text }
}

/// Score all candidate elements and return them ranked best-first.
///
/// Positive scores propagate upward (parent gets half, grandparent a
/// third), so a container full of good paragraphs outranks any single one
/// of them.
fn rank_candidates<'a>(doc: &'a Html, scorer: &Scorer, config: &ClassifyConfig) -> Vec<Candidate<'a>> {
    let selector = Selector::parse(CANDIDATE_SELECTOR).unwrap();

    let mut elements: HashMap<NodeId, ElementRef<'a>> = HashMap::new();
    let mut own: HashMap<NodeId, f64> = HashMap::new();
    let mut boost: HashMap<NodeId, f64> = HashMap::new();

    for element in doc.select(&selector) {
        let tag = element.value().name();
        let container = matches!(tag, "article" | "main" | "section");
        if !container && collapsed_text(&element).chars().count() < config.char_threshold {
            continue;
        }

        let score = scorer.score(&element).total;
        elements.insert(element.id(), element);
        own.insert(element.id(), score);

        if score <= 0.0 {
            continue;
        }
        if let Some(parent) = element.parent().and_then(ElementRef::wrap) {
            elements.entry(parent.id()).or_insert(parent);
            *boost.entry(parent.id()).or_insert(0.0) += score / 2.0;

            if let Some(grandparent) = parent.parent().and_then(ElementRef::wrap) {
                elements.entry(grandparent.id()).or_insert(grandparent);
                *boost.entry(grandparent.id()).or_insert(0.0) += score / 3.0;
            }
        }
    }

    let mut candidates: Vec<Candidate<'a>> = elements
        .into_iter()
        .map(|(id, element)| {
            let own_score = own.get(&id).copied().unwrap_or_else(|| scorer.score(&element).total);
            let score = own_score + boost.get(&id).copied().unwrap_or(0.0);
            Candidate { element, score }
        })
        .collect();

    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    candidates.truncate(config.max_candidates);
    candidates
}

/// Join the top candidate with its qualifying siblings, in document order.
fn assemble_block_text(top: &Candidate<'_>, candidates: &[Candidate<'_>], config: &ClassifyConfig) -> String {
    let Some(parent) = top.element.parent().and_then(ElementRef::wrap) else {
        return collapsed_text(&top.element);
    };

    let threshold = top.score * config.sibling_ratio;
    let ranked: HashMap<NodeId, f64> =
        candidates.iter().map(|c| (c.element.id(), c.score)).collect();

    let mut parts = Vec::new();
    for child in parent.children().filter_map(ElementRef::wrap) {
        if child.id() == top.element.id() {
            parts.push(collapsed_text(&top.element));
            continue;
        }
        if let Some(&score) = ranked.get(&child.id())
            && score > 0.0
            && score >= threshold
        {
            let text = collapsed_text(&child);
            if !text.is_empty() {
                parts.push(text);
            }
        }
    }

    if parts.is_empty() { collapsed_text(&top.element) } else { parts.join(" ") }
}

/// The page's title: the `<title>` element, falling back to the first
/// `<h1>`.
fn page_title(doc: &Html) -> Option<String> {
    let title = Selector::parse("title").unwrap();
    let h1 = Selector::parse("h1").unwrap();

    doc.select(&title)
        .next()
        .map(|el| collapsed_text(&el))
        .filter(|t| !t.is_empty())
        .or_else(|| doc.select(&h1).next().map(|el| collapsed_text(&el)).filter(|t| !t.is_empty()))
}

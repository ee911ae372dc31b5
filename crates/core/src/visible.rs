//! Visibility-aware text extraction from rendered pages.
//!
//! The extractor asks the engine to serialize `document.body` into a small
//! tagged node tree in which each element carries its own resolved visual
//! state, and then applies the visibility rule on the Rust side: an element whose
//! resolved style marks it not displayed, not visible, or fully transparent
//! is excluded together with *all* of its descendants, even ones that are
//! individually marked visible. Visibility inherits downward and
//! short-circuits the walk.
//!
//! Keeping the traversal rule here, over a fixed serialized shape, means
//! the engine contract stays narrow (one script, one JSON shape) and the
//! rule itself is testable without a browser.

use serde::{Deserialize, Serialize};

use crate::engine::PageHandle;
use crate::{Result, SiftError};

/// In-page script that snapshots `document.body` as a [`PageNode`] tree.
///
/// Each element records the visibility of its *own* computed style; the
/// inheritance rule lives in [`visible_text`]. Browsers resolve `<script>`
/// and `<style>` to `display: none`, so their text is excluded by the same
/// rule as any other hidden subtree.
pub const SNAPSHOT_SCRIPT: &str = r#"
(() => {
    function snapshot(node) {
        if (node.nodeType === Node.TEXT_NODE) {
            return { kind: "text", content: node.textContent };
        }
        if (node.nodeType !== Node.ELEMENT_NODE) {
            return null;
        }
        const style = window.getComputedStyle(node);
        const visible =
            style.display !== "none" &&
            style.visibility !== "hidden" &&
            parseFloat(style.opacity) !== 0;
        const children = [];
        for (const child of node.childNodes) {
            const snap = snapshot(child);
            if (snap !== null) {
                children.push(snap);
            }
        }
        return { kind: "element", tag: node.tagName.toLowerCase(), visible, children };
    }
    if (!document.body) {
        return { kind: "element", tag: "body", visible: false, children: [] };
    }
    return snapshot(document.body);
})()
"#;

/// One node of a rendered-page snapshot.
///
/// The tagged shape mirrors the DOM's element/text split: elements carry
/// their tag, their own resolved visibility, and their children; text nodes
/// carry raw content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PageNode {
    /// An element node with its resolved visual state.
    Element {
        tag: String,
        visible: bool,
        children: Vec<PageNode>,
    },
    /// A text node's raw content.
    Text { content: String },
}

/// Collect the text a visitor would actually see in a snapshot.
///
/// Text nodes are trimmed and joined with single spaces; an invisible
/// element hides its entire subtree. The result carries no leading or
/// trailing whitespace, and calling this twice on the same snapshot yields
/// the same string.
pub fn visible_text(node: &PageNode) -> String {
    let mut parts = Vec::new();
    collect_visible(node, &mut parts);
    parts.join(" ")
}

fn collect_visible<'a>(node: &'a PageNode, parts: &mut Vec<&'a str>) {
    match node {
        PageNode::Text { content } => {
            let trimmed = content.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed);
            }
        }
        PageNode::Element { visible, children, .. } => {
            if !visible {
                return;
            }
            for child in children {
                collect_visible(child, parts);
            }
        }
    }
}

/// Extract the visible text of a fully loaded page.
///
/// Evaluates [`SNAPSHOT_SCRIPT`] against the live DOM, deserializes the
/// typed snapshot, and walks it with [`visible_text`]. Fails with
/// [`SiftError::Render`] if the page handle is unusable or the snapshot
/// does not match the expected shape.
pub async fn extract_visible_text(page: &dyn PageHandle) -> Result<String> {
    let value = page.evaluate(SNAPSHOT_SCRIPT).await?;
    let snapshot = parse_snapshot(value)?;
    Ok(visible_text(&snapshot))
}

/// Deserialize an engine-provided snapshot value into a [`PageNode`] tree.
pub fn parse_snapshot(value: serde_json::Value) -> Result<PageNode> {
    serde_json::from_value(value)
        .map_err(|e| SiftError::Render(format!("malformed page snapshot: {}", e)))
}

//! HTML sanitization ahead of classification.
//!
//! The classifier works on the serialized post-render DOM, and a serialized
//! DOM still contains `<script>` and `<style>` bodies whose text would
//! pollute both density scores and the extracted content. This pass strips
//! non-content subtrees and inline-hidden elements with a streaming
//! rewriter before the document is parsed for scoring.

use lol_html::{HtmlRewriter, Settings, element};

/// Tags whose subtrees never contribute readable content.
const STRIP_TAGS: &[&str] = &["script", "style", "noscript", "template", "iframe", "svg", "canvas"];

/// Remove non-content and inline-hidden subtrees from an HTML document.
///
/// Never fails: if the rewriter chokes on the input, the original document
/// is returned unchanged and the classifier degrades gracefully from there.
pub fn sanitize_html(html: &str) -> String {
    let mut output = String::with_capacity(html.len());

    let mut handlers: Vec<_> = STRIP_TAGS
        .iter()
        .map(|tag| {
            element!(*tag, |el| {
                el.remove();
                Ok(())
            })
        })
        .collect();

    handlers.push(element!("[hidden]", |el| {
        el.remove();
        Ok(())
    }));

    handlers.push(element!("[style]", |el| {
        if let Some(style) = el.get_attribute("style") {
            let style = style.to_lowercase();
            let hidden = style.contains("display:none")
                || style.contains("display: none")
                || style.contains("visibility:hidden")
                || style.contains("visibility: hidden");
            if hidden {
                el.remove();
            }
        }
        Ok(())
    }));

    let mut rewriter = HtmlRewriter::new(
        Settings { element_content_handlers: handlers, ..Default::default() },
        |chunk: &[u8]| {
            output.push_str(&String::from_utf8_lossy(chunk));
        },
    );

    if rewriter.write(html.as_bytes()).is_err() {
        return html.to_string();
    }
    if rewriter.end().is_err() {
        return html.to_string();
    }

    if output.is_empty() { html.to_string() } else { output }
}

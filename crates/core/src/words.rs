//! Word counting over extracted page text.
//!
//! Counting is whitespace-collapsing: any run of whitespace (spaces, tabs,
//! newlines) acts as a single separator, and leading/trailing separators are
//! ignored, so `count_words("a  b\n c")` and `count_words("a b c")` agree.

/// Count the words in a piece of text.
///
/// Splits on Unicode whitespace and counts the non-empty tokens. Punctuation
/// attached to a token counts as part of that token, matching how a reader
/// would eyeball the length of a paragraph.
///
/// # Example
///
/// ```rust
/// use pagesift_core::words::count_words;
///
/// assert_eq!(count_words("Hello, rendered world!"), 3);
/// assert_eq!(count_words("   \n\t  "), 0);
/// ```
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Count the words in an optional piece of text.
///
/// Absent text counts as zero words.
pub fn count_words_opt(text: Option<&str>) -> usize {
    text.map(count_words).unwrap_or(0)
}

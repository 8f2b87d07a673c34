//! Text normalization
//!
//! Pure string transforms applied to extracted text before it is stored.

use serde::Serialize;

/// Maximum characters kept in a page snippet
const SNIPPET_CHARS: usize = 200;

/// Descriptive statistics for one page of cleaned text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageOverview {
    pub page_number: usize,
    pub content_snippet: String,
    pub char_count: usize,
    pub word_count: usize,
}

/// Collapse blank lines and whitespace runs, then trim
///
/// Blank-line runs first fold to a single newline, then every whitespace run
/// (newlines included) folds to one space. The result contains no newlines,
/// which makes the transform idempotent.
pub fn clean_text(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !cleaned.is_empty() {
            cleaned.push(' ');
        }
        cleaned.push_str(word);
    }
    cleaned
}

/// Split text into pages on form feeds, or on blank lines when there are none
pub fn split_pages(text: &str) -> Vec<&str> {
    if text.contains('\u{c}') {
        text.split('\u{c}').collect()
    } else {
        text.split("\n\n").collect()
    }
}

/// Build a per-page overview of the given text
pub fn page_overview(text: &str) -> Vec<PageOverview> {
    split_pages(text)
        .into_iter()
        .enumerate()
        .map(|(i, page)| {
            let cleaned = clean_text(page);
            let char_count = cleaned.chars().count();
            let content_snippet = if char_count > SNIPPET_CHARS {
                let mut snippet: String = cleaned.chars().take(SNIPPET_CHARS).collect();
                snippet.push_str("...");
                snippet
            } else {
                cleaned.clone()
            };

            PageOverview {
                page_number: i + 1,
                content_snippet,
                char_count,
                word_count: cleaned.split_whitespace().count(),
            }
        })
        .collect()
}

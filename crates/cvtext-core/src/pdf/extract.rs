//! Embedded-text extraction for single pages.

use tracing::trace;

use super::DocumentHandle;
use crate::error::{ExtractError, Result};

/// The text run extracted from one page.
///
/// Fragments are opaque strings in extractor-reported order, which follows
/// the page's content stream rather than visual reading order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// Page number (1-indexed).
    pub number: u32,
    /// Decoded text fragments; empty for pages without a text layer.
    pub fragments: Vec<String>,
}

/// Extract the embedded text run for page `number`.
///
/// A page that merely lacks a text layer yields an empty fragment list; a
/// page that cannot be decoded at all is `DocumentCorrupt`. No judgement is
/// made here about whether the text is usable.
pub fn extract_page_text(doc: &DocumentHandle, number: u32) -> Result<PageText> {
    if doc.page_id(number).is_none() {
        return Err(ExtractError::DocumentCorrupt(format!(
            "page {number} is missing from the page tree"
        )));
    }

    let raw = doc
        .inner()
        .extract_text(&[number])
        .map_err(|e| ExtractError::DocumentCorrupt(format!("page {number}: {e}")))?;

    let fragments = split_runs(&raw);
    trace!("page {}: {} text fragments", number, fragments.len());
    Ok(PageText { number, fragments })
}

/// One fragment per decoded text object. Fully empty runs are dropped;
/// whitespace-only runs are kept, since judging usefulness is not this
/// layer's job.
fn split_runs(raw: &str) -> Vec<String> {
    raw.lines()
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn split_runs_keeps_whitespace_fragments() {
        assert_eq!(split_runs("alpha\n   \n\nbeta\n"), vec!["alpha", "   ", "beta"]);
    }

    #[test]
    fn split_runs_of_empty_text_is_empty() {
        assert!(split_runs("").is_empty());
    }
}

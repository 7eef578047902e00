//! Page splitting.
//!
//! A document is cut into logical pages on `newpage` lines:
//!
//! ```text
//! A -> B
//! @newpage Second      <- marker, consumed; "Second" opens the next page
//! B -> C
//! ```
//!
//! The marker must sit on its own line: it is preceded by a newline
//! (optionally followed by whitespace), may carry a leading `@`, is matched
//! case-insensitively, may be followed by a title, and must be followed by
//! another newline. The marker line, including its terminating newline, is
//! not part of either neighboring fragment.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::titles::normalize;

static PAGE_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\n\s*@?newpage(?:[\t ]+([^\n]+)|[\t ]*\r?)").unwrap()
});

/// A consumed page-break marker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageBreak {
    span: Range<usize>,
    title: Option<String>,
}

impl PageBreak {
    /// Byte range of the marker in the source, terminating newline included.
    #[must_use]
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    /// Title written after the marker, if any.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }
}

/// Source text of one logical page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageFragment {
    text: String,
    span: Range<usize>,
    page_break: Option<PageBreak>,
}

impl PageFragment {
    fn new(source: &str, span: Range<usize>, page_break: Option<PageBreak>) -> Self {
        Self {
            text: source[span.clone()].to_owned(),
            span,
            page_break,
        }
    }

    /// Fragment text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Byte offset of the fragment in the source.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.span.start
    }

    /// Byte range of the fragment in the source.
    #[must_use]
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    /// Marker that opened this fragment (`None` for the first one).
    #[must_use]
    pub fn page_break(&self) -> Option<&PageBreak> {
        self.page_break.as_ref()
    }

    /// Title of the opening marker.
    #[must_use]
    pub fn break_title(&self) -> Option<&str> {
        self.page_break.as_ref().and_then(PageBreak::title)
    }

    /// Whether `other` has the same text and opening title.
    ///
    /// Offsets are ignored: an edit on an earlier page shifts offsets without
    /// changing what this page renders.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.text == other.text && self.break_title() == other.break_title()
    }
}

/// Split `source` into page fragments in document order.
///
/// Always returns at least one fragment. Fragments and the spans of their
/// opening markers tile the source exactly.
#[must_use]
pub fn split_pages(source: &str) -> Vec<PageFragment> {
    let mut fragments = Vec::new();
    let mut fragment_start = 0;
    let mut opening: Option<PageBreak> = None;
    let mut search_from = 0;

    while let Some(caps) = PAGE_BREAK.captures_at(source, search_from) {
        let Some(marker) = caps.get(0) else { break };
        if !source[marker.end()..].starts_with('\n') {
            // Marker line not terminated by a newline: not a page break.
            search_from = marker.start() + 1;
            continue;
        }

        // A marker directly after another one starts on the newline the
        // previous marker already consumed.
        let marker_start = marker.start().max(fragment_start);
        let marker_end = marker.end() + 1;
        fragments.push(PageFragment::new(
            source,
            fragment_start..marker_start,
            opening.take(),
        ));
        opening = Some(PageBreak {
            span: marker_start..marker_end,
            title: normalize(caps.get(1).map(|t| t.as_str())),
        });
        fragment_start = marker_end;
        search_from = marker.end();
    }

    fragments.push(PageFragment::new(
        source,
        fragment_start..source.len(),
        opening,
    ));
    tracing::trace!(fragments = fragments.len(), "split pages");
    fragments
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(source: &str) -> Vec<String> {
        split_pages(source)
            .iter()
            .map(|f| f.text().to_owned())
            .collect()
    }

    /// Rebuild the source from fragments and their opening markers.
    fn reassemble(source: &str) -> String {
        split_pages(source)
            .iter()
            .map(|f| {
                let marker = f.page_break().map_or("", |b| &source[b.span()]);
                format!("{marker}{}", f.text())
            })
            .collect()
    }

    #[test]
    fn test_no_marker_single_fragment() {
        let source = "@startuml\nA -> B\n@enduml";
        let fragments = split_pages(source);
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].text(), source);
        assert_eq!(fragments[0].offset(), 0);
        assert_eq!(fragments[0].page_break(), None);
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(texts(""), vec![String::new()]);
    }

    #[test]
    fn test_marker_with_title() {
        let fragments = split_pages("A\n@newpage Second\nB");
        assert_eq!(texts("A\n@newpage Second\nB"), vec!["A", "B"]);
        assert_eq!(fragments[0].break_title(), None);
        assert_eq!(fragments[1].break_title(), Some("Second"));
        assert_eq!(fragments[1].offset(), 18);
    }

    #[test]
    fn test_k_markers_k_plus_one_fragments() {
        let source = "A\nnewpage\nB\n  NEWPAGE  Third page \nC\n@NewPage\nD";
        let fragments = split_pages(source);
        assert_eq!(texts(source), vec!["A", "B", "C", "D"]);
        assert_eq!(
            fragments.iter().map(PageFragment::break_title).collect::<Vec<_>>(),
            vec![None, None, Some("Third page"), None]
        );
        assert_eq!(reassemble(source), source);
    }

    #[test]
    fn test_marker_without_trailing_newline_ignored() {
        assert_eq!(texts("A\nnewpage"), vec!["A\nnewpage"]);
        assert_eq!(texts("A\nnewpage Last"), vec!["A\nnewpage Last"]);
    }

    #[test]
    fn test_marker_on_first_line_ignored() {
        assert_eq!(texts("newpage\nA"), vec!["newpage\nA"]);
    }

    #[test]
    fn test_word_must_end_at_blank() {
        assert_eq!(texts("A\nnewpages\nB"), vec!["A\nnewpages\nB"]);
    }

    #[test]
    fn test_consecutive_markers_yield_empty_fragment() {
        let source = "A\nnewpage\nnewpage Two\nB";
        let fragments = split_pages(source);
        assert_eq!(texts(source), vec!["A", "", "B"]);
        assert_eq!(fragments[2].break_title(), Some("Two"));
        assert_eq!(reassemble(source), source);
    }

    #[test]
    fn test_blank_title_is_absent() {
        let fragments = split_pages("A\nnewpage    \nB");
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[1].break_title(), None);
    }

    #[test]
    fn test_crlf_marker() {
        let source = "A\r\nnewpage\r\nB";
        assert_eq!(texts(source), vec!["A\r", "B"]);
        assert_eq!(reassemble(source), source);
    }

    #[test]
    fn test_fragments_tile_source() {
        let sources = [
            "",
            "plain",
            "A\nnewpage\nB",
            "\n\nnewpage\n\n",
            "x\n @newpage t\ny\nnewpage\nz\nnewpage",
            "A\nnewpage\nnewpage\nnewpage\nB",
        ];
        for source in sources {
            let fragments = split_pages(source);
            let mut cursor = 0;
            for f in &fragments {
                if let Some(b) = f.page_break() {
                    assert_eq!(b.span().start, cursor, "gap before marker in {source:?}");
                    cursor = b.span().end;
                }
                assert_eq!(f.span().start, cursor, "gap before fragment in {source:?}");
                cursor = f.span().end;
            }
            assert_eq!(cursor, source.len(), "tail not covered in {source:?}");
            assert_eq!(reassemble(source), source);
        }
    }

    #[test]
    fn test_same_content_ignores_offset() {
        let a = split_pages("A\nnewpage T\nB");
        let b = split_pages("AAAA\nnewpage T\nB");
        let c = split_pages("A\nnewpage U\nB");
        assert!(a[1].same_content(&b[1]));
        assert!(!a[0].same_content(&b[0]));
        assert!(!a[1].same_content(&c[1]));
    }
}

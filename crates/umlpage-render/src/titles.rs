//! Per-page title extraction.

use umlpage_engine::{Diagram, DiagramKind};

/// Ordered page titles, one slot per page.
///
/// An absent title is `None`, never an empty string, so hosts can tell
/// "untitled" apart from "titled with nothing".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Titles(Vec<Option<String>>);

impl Titles {
    /// Wrap an ordered list of titles.
    #[must_use]
    pub fn new(titles: Vec<Option<String>>) -> Self {
        Self(titles)
    }

    /// Number of slots (equals the page count).
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no pages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Title of page `index`; `None` when the page is untitled or out of range.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).and_then(Option::as_deref)
    }

    /// All slots in page order.
    #[must_use]
    pub fn as_slice(&self) -> &[Option<String>] {
        &self.0
    }

    /// Iterate over slots in page order.
    pub fn iter(&self) -> impl Iterator<Item = Option<&str>> {
        self.0.iter().map(Option::as_deref)
    }
}

impl FromIterator<Option<String>> for Titles {
    fn from_iter<I: IntoIterator<Item = Option<String>>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Titles for every page of every diagram, in page order.
#[must_use]
pub fn extract_titles(diagrams: &[Diagram]) -> Titles {
    let mut titles = Vec::with_capacity(diagrams.iter().map(Diagram::page_count).sum());
    for diagram in diagrams {
        push_diagram_titles(diagram, &mut titles);
    }
    Titles(titles)
}

/// Append one slot per page of `diagram`.
pub(crate) fn push_diagram_titles(diagram: &Diagram, titles: &mut Vec<Option<String>>) {
    let before = titles.len();
    match diagram.kind() {
        DiagramKind::Sequence {
            title, page_breaks, ..
        } => {
            titles.push(normalize(title.as_deref()));
            titles.extend(page_breaks.iter().map(|t| normalize(t.as_deref())));
        }
        DiagramKind::Paged { pages } => {
            titles.extend(pages.iter().map(|p| normalize(p.title.as_deref())));
        }
        DiagramKind::Simple { title, .. } | DiagramKind::Error { title } => {
            titles.push(normalize(title.as_deref()));
        }
    }
    debug_assert_eq!(titles.len() - before, diagram.page_count());
}

/// Absent and blank titles both become `None`.
pub(crate) fn normalize(title: Option<&str>) -> Option<String> {
    title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use umlpage_engine::{DiagramEngine, IncludeContext, MockEngine};

    fn diagrams(source: &str) -> Vec<Diagram> {
        MockEngine::new()
            .parse(source, &IncludeContext::default())
            .unwrap()
            .into_iter()
            .map(umlpage_engine::Block::into_diagram)
            .collect()
    }

    fn owned(titles: &[Option<&str>]) -> Vec<Option<String>> {
        titles.iter().map(|t| t.map(str::to_owned)).collect()
    }

    #[test]
    fn test_sequence_title_then_page_breaks() {
        let titles = extract_titles(&diagrams("title Intro\nA\nnewpage\nB\nnewpage Last\nC"));
        assert_eq!(titles.as_slice(), owned(&[Some("Intro"), None, Some("Last")]));
    }

    #[test]
    fn test_paged_one_title_per_page() {
        let titles = extract_titles(&diagrams("!paged\npage One\npage\npage Three"));
        assert_eq!(titles.as_slice(), owned(&[Some("One"), None, Some("Three")]));
    }

    #[test]
    fn test_simple_and_error_across_blocks() {
        let source = "@startuml\ntitle First\n@enduml\n@startuml\n!error\n@enduml\n@startuml\n!error Oops\n@enduml\n@startuml\nA\n@enduml";
        let titles = extract_titles(&diagrams(source));
        assert_eq!(
            titles.as_slice(),
            owned(&[Some("First"), None, Some("Oops"), None])
        );
    }

    #[test]
    fn test_len_matches_page_count() {
        let ds = diagrams("@startuml\nA\nnewpage\nB\n@enduml\n@startuml\n!paged\npage\npage\n@enduml");
        let pages: usize = ds.iter().map(Diagram::page_count).sum();
        assert_eq!(extract_titles(&ds).len(), pages);
    }

    #[test]
    fn test_normalize_blank_is_absent() {
        assert_eq!(normalize(Some("")), None);
        assert_eq!(normalize(Some("   ")), None);
        assert_eq!(normalize(None), None);
        assert_eq!(normalize(Some(" Hi ")), Some("Hi".to_owned()));
    }

    #[test]
    fn test_titles_accessors() {
        let titles: Titles = vec![None, Some("Two".to_owned())].into_iter().collect();
        assert_eq!(titles.get(0), None);
        assert_eq!(titles.get(1), Some("Two"));
        assert_eq!(titles.get(5), None);
        assert_eq!(titles.iter().collect::<Vec<_>>(), vec![None, Some("Two")]);
    }
}

//! Engine-produced diagrams.
//!
//! A [`Diagram`] is one rendered unit. What the orchestration layer needs to
//! know about it (titles, page structure, scale) lives in an explicit
//! [`DiagramKind`]; everything else stays inside the engine behind
//! [`PageSource`].

use std::fmt;
use std::sync::Arc;

use crate::error::EngineError;
use crate::format::ImageFormat;

/// Display scale with set-once semantics.
///
/// A diagram starts either unscaled or with a scale declared by its own
/// source. Once a value is present it is never overwritten.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Scale(Option<f64>);

impl Scale {
    /// No scale set yet.
    #[must_use]
    pub const fn unset() -> Self {
        Self(None)
    }

    /// A scale the diagram source already declared.
    #[must_use]
    pub const fn declared(factor: f64) -> Self {
        Self(Some(factor))
    }

    /// The scale value, if one was set.
    #[must_use]
    pub fn get(self) -> Option<f64> {
        self.0
    }

    /// The factor to encode with (1.0 when unset).
    #[must_use]
    pub fn factor(self) -> f64 {
        self.0.unwrap_or(1.0)
    }

    /// Set the scale unless one is already present.
    ///
    /// Returns `true` if the value was stored.
    pub fn set_if_absent(&mut self, factor: f64) -> bool {
        if self.0.is_some() {
            return false;
        }
        self.0 = Some(factor);
        true
    }
}

/// One page nested inside a paged container.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageDiagram {
    /// Page title, if the page declares one.
    pub title: Option<String>,
    /// Page scale.
    pub scale: Scale,
}

impl PageDiagram {
    /// Create an unscaled page.
    #[must_use]
    pub fn new(title: Option<String>) -> Self {
        Self {
            title,
            scale: Scale::unset(),
        }
    }
}

/// Structural kind of a diagram.
#[derive(Clone, Debug, PartialEq)]
pub enum DiagramKind {
    /// Multi-page sequential diagram split by internal page-break events.
    Sequence {
        /// Diagram title (first page).
        title: Option<String>,
        /// Title of each internal page break, in order.
        page_breaks: Vec<Option<String>>,
        /// Scale applied to every page.
        scale: Scale,
    },
    /// Container whose pages are independent diagrams.
    Paged {
        /// Nested pages, in order.
        pages: Vec<PageDiagram>,
    },
    /// Single-page diagram.
    Simple {
        /// Diagram title.
        title: Option<String>,
        /// Diagram scale.
        scale: Scale,
    },
    /// Placeholder diagram describing a source error.
    Error {
        /// Title carried by the failing block, if any.
        title: Option<String>,
    },
}

impl DiagramKind {
    /// Number of image pages this kind produces.
    #[must_use]
    pub fn page_count(&self) -> usize {
        match self {
            Self::Sequence { page_breaks, .. } => page_breaks.len() + 1,
            Self::Paged { pages } => pages.len(),
            Self::Simple { .. } | Self::Error { .. } => 1,
        }
    }
}

/// Engine-side encoder for the pages of one diagram.
pub trait PageSource: Send + Sync + fmt::Debug {
    /// Encode page `index` at `scale` into `format`.
    fn render_page(
        &self,
        index: usize,
        scale: f64,
        format: ImageFormat,
    ) -> Result<Vec<u8>, EngineError>;
}

/// One rendered unit produced by a [`DiagramEngine`](crate::DiagramEngine).
#[derive(Clone, Debug)]
pub struct Diagram {
    kind: DiagramKind,
    pages: Arc<dyn PageSource>,
}

impl Diagram {
    /// Create a diagram from its kind and page encoder.
    #[must_use]
    pub fn new(kind: DiagramKind, pages: Arc<dyn PageSource>) -> Self {
        Self { kind, pages }
    }

    /// Structural kind (titles, scales).
    #[must_use]
    pub fn kind(&self) -> &DiagramKind {
        &self.kind
    }

    /// Mutable access to the kind, used to apply display scale.
    pub fn kind_mut(&mut self) -> &mut DiagramKind {
        &mut self.kind
    }

    /// Number of image pages.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.kind.page_count()
    }

    /// Scale that applies to page `index`.
    #[must_use]
    pub fn page_scale(&self, index: usize) -> Scale {
        match &self.kind {
            DiagramKind::Sequence { scale, .. } | DiagramKind::Simple { scale, .. } => *scale,
            DiagramKind::Paged { pages } => pages.get(index).map(|p| p.scale).unwrap_or_default(),
            DiagramKind::Error { .. } => Scale::unset(),
        }
    }

    /// Encode page `index` into `format` at the page's current scale.
    pub fn render_page(&self, index: usize, format: ImageFormat) -> Result<Vec<u8>, EngineError> {
        let count = self.page_count();
        if index >= count {
            return Err(EngineError::PageOutOfRange { index, count });
        }
        let scale = self.page_scale(index).factor();
        self.pages.render_page(index, scale, format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct EchoPages;

    impl PageSource for EchoPages {
        fn render_page(
            &self,
            index: usize,
            scale: f64,
            format: ImageFormat,
        ) -> Result<Vec<u8>, EngineError> {
            Ok(format!("{index}@{scale}.{format}").into_bytes())
        }
    }

    fn diagram(kind: DiagramKind) -> Diagram {
        Diagram::new(kind, Arc::new(EchoPages))
    }

    #[test]
    fn test_scale_set_once() {
        let mut scale = Scale::unset();
        assert_eq!(scale.factor(), 1.0);
        assert!(scale.set_if_absent(1.5));
        assert!(!scale.set_if_absent(2.0));
        assert_eq!(scale.get(), Some(1.5));

        let mut declared = Scale::declared(0.5);
        assert!(!declared.set_if_absent(1.5));
        assert_eq!(declared.factor(), 0.5);
    }

    #[test]
    fn test_page_count_per_kind() {
        let sequence = DiagramKind::Sequence {
            title: None,
            page_breaks: vec![None, Some("Two".to_owned())],
            scale: Scale::unset(),
        };
        assert_eq!(sequence.page_count(), 3);

        let paged = DiagramKind::Paged {
            pages: vec![PageDiagram::new(None); 4],
        };
        assert_eq!(paged.page_count(), 4);

        assert_eq!(DiagramKind::Error { title: None }.page_count(), 1);
    }

    #[test]
    fn test_render_page_uses_page_scale() {
        let mut pages = vec![PageDiagram::new(None), PageDiagram::new(None)];
        pages[1].scale = Scale::declared(2.0);
        let d = diagram(DiagramKind::Paged { pages });

        assert_eq!(d.render_page(0, ImageFormat::Png).unwrap(), b"0@1.png");
        assert_eq!(d.render_page(1, ImageFormat::Svg).unwrap(), b"1@2.svg");
    }

    #[test]
    fn test_render_page_out_of_range() {
        let d = diagram(DiagramKind::Simple {
            title: None,
            scale: Scale::unset(),
        });
        let err = d.render_page(1, ImageFormat::Png).unwrap_err();
        assert!(matches!(
            err,
            EngineError::PageOutOfRange { index: 1, count: 1 }
        ));
    }
}

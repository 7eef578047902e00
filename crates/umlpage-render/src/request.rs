//! Render requests.

use std::path::{Path, PathBuf};

use umlpage_engine::ImageFormat;

use crate::consts::DEFAULT_ZOOM;

/// Which page images a render should encode.
///
/// Titles and the page count are always computed for the whole document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// Every page.
    #[default]
    All,
    /// Only the page with this 0-based index.
    Single(usize),
}

impl PageSelection {
    /// Map a host page number where any negative value means "all pages".
    #[must_use]
    pub fn from_index(page: i64) -> Self {
        usize::try_from(page).map_or(Self::All, Self::Single)
    }

    /// Decide, per page, whether its image is encoded.
    ///
    /// `Single(n)` encodes only page `n`, except when `n` is out of range or
    /// the page count changed since the previous render: then the host has to
    /// rebuild its page list and every page is encoded.
    pub(crate) fn pages_to_encode(self, total: usize, previous_total: Option<usize>) -> Vec<bool> {
        match self {
            Self::Single(page) if page < total && previous_total.is_none_or(|p| p == total) => {
                (0..total).map(|i| i == page).collect()
            }
            Self::Single(page) => {
                tracing::debug!(
                    page,
                    total,
                    ?previous_total,
                    "page count changed or page out of range, encoding all pages"
                );
                vec![true; total]
            }
            Self::All => vec![true; total],
        }
    }
}

/// What to render.
///
/// Immutable once built; renders never modify their request.
///
/// # Example
///
/// ```
/// use umlpage_engine::ImageFormat;
/// use umlpage_render::{PageSelection, RenderRequest};
///
/// let request = RenderRequest::new("@startuml\nA -> B\n@enduml")
///     .zoom(150)
///     .format(ImageFormat::Svg)
///     .page(PageSelection::Single(0));
/// assert_eq!(request.zoom_percent(), 150);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderRequest {
    source: String,
    base_dir: Option<PathBuf>,
    page: PageSelection,
    zoom: u32,
    format: ImageFormat,
    width: Option<u32>,
}

impl RenderRequest {
    /// Request all pages of `source` as PNG at 100% zoom.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            base_dir: None,
            page: PageSelection::All,
            zoom: DEFAULT_ZOOM,
            format: ImageFormat::Png,
            width: None,
        }
    }

    /// Directory includes are resolved against.
    #[must_use]
    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Pages to encode.
    #[must_use]
    pub fn page(mut self, page: PageSelection) -> Self {
        self.page = page;
        self
    }

    /// Zoom in percent.
    #[must_use]
    pub fn zoom(mut self, zoom: u32) -> Self {
        self.zoom = zoom;
        self
    }

    /// Output format.
    #[must_use]
    pub fn format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }

    /// Resample raster pages to this width.
    #[must_use]
    pub fn width(mut self, width: Option<u32>) -> Self {
        self.width = width;
        self
    }

    /// Document source.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Include base directory.
    #[must_use]
    pub fn include_base(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    /// Selected pages.
    #[must_use]
    pub fn selection(&self) -> PageSelection {
        self.page
    }

    /// Zoom in percent.
    #[must_use]
    pub fn zoom_percent(&self) -> u32 {
        self.zoom
    }

    /// Output format.
    #[must_use]
    pub fn image_format(&self) -> ImageFormat {
        self.format
    }

    /// Target raster width.
    #[must_use]
    pub fn target_width(&self) -> Option<u32> {
        self.width
    }

    /// Whether images rendered for `other` look exactly like images for this request.
    pub(crate) fn same_output(&self, other: &Self) -> bool {
        self.zoom == other.zoom && self.format == other.format && self.width == other.width
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_index() {
        assert_eq!(PageSelection::from_index(-1), PageSelection::All);
        assert_eq!(PageSelection::from_index(-7), PageSelection::All);
        assert_eq!(PageSelection::from_index(0), PageSelection::Single(0));
        assert_eq!(PageSelection::from_index(3), PageSelection::Single(3));
    }

    #[test]
    fn test_all_encodes_every_page() {
        assert_eq!(PageSelection::All.pages_to_encode(3, Some(1)), vec![true; 3]);
        assert!(PageSelection::All.pages_to_encode(0, None).is_empty());
    }

    #[test]
    fn test_single_page_same_count() {
        assert_eq!(
            PageSelection::Single(1).pages_to_encode(3, Some(3)),
            vec![false, true, false]
        );
        assert_eq!(
            PageSelection::Single(0).pages_to_encode(2, None),
            vec![true, false]
        );
    }

    #[test]
    fn test_single_page_count_changed_encodes_all() {
        assert_eq!(
            PageSelection::Single(1).pages_to_encode(3, Some(2)),
            vec![true; 3]
        );
    }

    #[test]
    fn test_single_page_out_of_range_encodes_all() {
        assert_eq!(
            PageSelection::Single(5).pages_to_encode(2, Some(2)),
            vec![true; 2]
        );
    }

    #[test]
    fn test_builder_and_same_output() {
        let base = RenderRequest::new("A").zoom(150).width(Some(640));
        assert_eq!(base.source(), "A");
        assert_eq!(base.zoom_percent(), 150);
        assert_eq!(base.image_format(), ImageFormat::Png);
        assert_eq!(base.target_width(), Some(640));
        assert_eq!(base.include_base(), None);

        let other_source = RenderRequest::new("B")
            .zoom(150)
            .width(Some(640))
            .base_dir("/docs")
            .page(PageSelection::Single(2));
        assert!(base.same_output(&other_source));
        assert!(!base.same_output(&base.clone().zoom(100)));
        assert!(!base.same_output(&base.clone().format(ImageFormat::Svg)));
        assert!(!base.same_output(&base.clone().width(None)));
    }
}

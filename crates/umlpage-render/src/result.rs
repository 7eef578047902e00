//! Render results.

use std::sync::Arc;
use std::time::Duration;

use crate::titles::Titles;

/// Encoded page image, shared between results and cache entries.
pub type PageImage = Arc<[u8]>;

/// How a result was produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderStrategy {
    /// Whole document rendered in one engine pass.
    Normal,
    /// Page by page, reusing unchanged pages of the previous render.
    Partial,
}

/// Bookkeeping for one render call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Fragments the document was split into.
    pub fragments: usize,
    /// Fragments parsed by the engine during this call.
    pub rendered_fragments: usize,
    /// Fragments taken from the previous render.
    pub reused_fragments: usize,
    /// Page images encoded during this call.
    pub encoded_pages: usize,
    /// Wall-clock time of the call.
    pub elapsed: Duration,
}

/// Outcome of one render call. Immutable.
#[derive(Clone, Debug)]
pub struct RenderResult {
    strategy: RenderStrategy,
    titles: Titles,
    images: Vec<Option<PageImage>>,
    stats: RenderStats,
}

impl RenderResult {
    pub(crate) fn new(
        strategy: RenderStrategy,
        titles: Titles,
        images: Vec<Option<PageImage>>,
        stats: RenderStats,
    ) -> Self {
        debug_assert_eq!(titles.len(), images.len());
        Self {
            strategy,
            titles,
            images,
            stats,
        }
    }

    /// Strategy that produced the result.
    #[must_use]
    pub fn strategy(&self) -> RenderStrategy {
        self.strategy
    }

    /// Total number of pages in the document.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.titles.len()
    }

    /// One title slot per page.
    #[must_use]
    pub fn titles(&self) -> &Titles {
        &self.titles
    }

    /// One image slot per page; `None` for pages that have no image yet.
    ///
    /// A partial render also carries images of reused pages encoded by an
    /// earlier call.
    #[must_use]
    pub fn images(&self) -> &[Option<PageImage>] {
        &self.images
    }

    /// Image of page `index`, if one is available.
    #[must_use]
    pub fn image(&self, index: usize) -> Option<&[u8]> {
        self.images.get(index).and_then(|i| i.as_deref())
    }

    /// Timing and reuse statistics.
    #[must_use]
    pub fn stats(&self) -> &RenderStats {
        &self.stats
    }
}

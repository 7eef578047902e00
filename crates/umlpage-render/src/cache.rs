//! In-memory render cache.
//!
//! Provides [`RenderCache`], which keeps the last [`RenderCacheItem`] per
//! document so the next render of the same document can reuse unchanged
//! pages. Items are immutable: a successful render builds a new item and
//! swaps it in; a failed or cancelled render leaves the old one untouched.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use umlpage_engine::{Diagram, IncludeContext};

use crate::request::RenderRequest;
use crate::result::{PageImage, RenderResult, RenderStrategy};
use crate::splitter::PageFragment;

/// Render state of one fragment, kept for reuse by the next partial render.
#[derive(Debug)]
pub struct FragmentRender {
    diagrams: Arc<[Diagram]>,
    titles: Vec<Option<String>>,
    images: Vec<Option<PageImage>>,
}

impl FragmentRender {
    pub(crate) fn new(
        diagrams: Arc<[Diagram]>,
        titles: Vec<Option<String>>,
        images: Vec<Option<PageImage>>,
    ) -> Self {
        debug_assert_eq!(titles.len(), images.len());
        Self {
            diagrams,
            titles,
            images,
        }
    }

    /// Scaled diagrams of the fragment.
    #[must_use]
    pub fn diagrams(&self) -> &Arc<[Diagram]> {
        &self.diagrams
    }

    /// One title per page of the fragment.
    #[must_use]
    pub fn titles(&self) -> &[Option<String>] {
        &self.titles
    }

    /// One image slot per page of the fragment.
    #[must_use]
    pub fn images(&self) -> &[Option<PageImage>] {
        &self.images
    }

    /// Pages contributed by the fragment.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.titles.len()
    }
}

/// Everything a render produced, plus what it was computed from.
#[derive(Debug)]
pub struct RenderCacheItem {
    request: RenderRequest,
    includes: IncludeContext,
    fragments: Vec<PageFragment>,
    renders: Vec<Arc<FragmentRender>>,
    result: Arc<RenderResult>,
}

impl RenderCacheItem {
    pub(crate) fn new(
        request: RenderRequest,
        includes: IncludeContext,
        fragments: Vec<PageFragment>,
        renders: Vec<Arc<FragmentRender>>,
        result: RenderResult,
    ) -> Self {
        debug_assert!(renders.is_empty() || renders.len() == fragments.len());
        Self {
            request,
            includes,
            fragments,
            renders,
            result: Arc::new(result),
        }
    }

    /// Request the item was rendered for.
    #[must_use]
    pub fn request(&self) -> &RenderRequest {
        &self.request
    }

    /// Include search path the item's sources were resolved against.
    #[must_use]
    pub fn includes(&self) -> &IncludeContext {
        &self.includes
    }

    /// Exact source text the item was rendered from.
    #[must_use]
    pub fn source(&self) -> &str {
        self.request.source()
    }

    /// Fragment boundaries of that source.
    #[must_use]
    pub fn fragments(&self) -> &[PageFragment] {
        &self.fragments
    }

    /// Per-fragment state; empty unless the item came from a partial render.
    #[must_use]
    pub fn fragment_renders(&self) -> &[Arc<FragmentRender>] {
        &self.renders
    }

    /// The render result.
    #[must_use]
    pub fn result(&self) -> &Arc<RenderResult> {
        &self.result
    }

    /// Whether the item came from a partial render.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.result.strategy() == RenderStrategy::Partial
    }
}

/// Last render per document identity.
///
/// Internally synchronized so distinct documents can be rendered from
/// different threads through one cache. Renders of the same document must be
/// serialized by the caller.
#[derive(Debug, Default)]
pub struct RenderCache {
    items: RwLock<HashMap<String, Arc<RenderCacheItem>>>,
}

impl RenderCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last item rendered for `document`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn get(&self, document: &str) -> Option<Arc<RenderCacheItem>> {
        self.items.read().unwrap().get(document).cloned()
    }

    /// Replace the item for `document`, returning the stored handle.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn insert(&self, document: &str, item: RenderCacheItem) -> Arc<RenderCacheItem> {
        let item = Arc::new(item);
        self.items
            .write()
            .unwrap()
            .insert(document.to_owned(), Arc::clone(&item));
        item
    }

    /// Drop the item for `document`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn invalidate(&self, document: &str) {
        self.items.write().unwrap().remove(document);
    }

    /// Drop every item.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn clear(&self) {
        self.items.write().unwrap().clear();
    }

    /// Number of cached documents.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.read().unwrap().len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! Render orchestration.
//!
//! [`render`] turns one [`RenderRequest`] into a new [`RenderCacheItem`],
//! optionally reusing the previous item for the same document. [`Renderer`]
//! wraps it with a [`RenderCache`] keyed by document identity.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use umlpage_engine::{Diagram, DiagramEngine, IncludeContext};

use crate::cache::{RenderCache, RenderCacheItem};
use crate::cancel::CancellationToken;
use crate::consts::DEFAULT_PARTIAL_MARKER;
use crate::error::RenderError;
use crate::request::RenderRequest;
use crate::resize::fit_width;
use crate::result::{PageImage, RenderResult, RenderStrategy};
use crate::scale::apply_zoom;
use crate::splitter::{PageFragment, split_pages};
use crate::{normal, partial};

/// Convert Duration to milliseconds as f64.
fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Settings shared by every render of a [`Renderer`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    /// Substring in the first page that opts a document into partial rendering.
    pub partial_marker: String,
    /// Directories searched for includes after the document's own directory.
    pub include_dirs: Vec<PathBuf>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            partial_marker: DEFAULT_PARTIAL_MARKER.to_owned(),
            include_dirs: Vec::new(),
        }
    }
}

/// Pick the strategy for a split document.
///
/// Only the first fragment is searched, as plain text: a marker inside a
/// comment counts too. An empty marker never matches.
#[must_use]
pub fn select_strategy(fragments: &[PageFragment], marker: &str) -> RenderStrategy {
    let partial = !marker.is_empty()
        && fragments
            .first()
            .is_some_and(|first| first.text().contains(marker));
    if partial {
        RenderStrategy::Partial
    } else {
        RenderStrategy::Normal
    }
}

/// Render `request`, reusing `previous` where the strategy allows.
///
/// `previous` must be the last successful render of the same document. It is
/// only read; the caller decides whether to store the returned item.
///
/// # Errors
///
/// Returns [`RenderError::Parse`] for malformed source,
/// [`RenderError::Io`] when encoding or resampling a page fails, and
/// [`RenderError::Cancelled`] when `cancel` fires at a safe point. No partial
/// result is produced on error.
pub fn render(
    engine: &dyn DiagramEngine,
    options: &RenderOptions,
    request: &RenderRequest,
    previous: Option<&RenderCacheItem>,
    cancel: &CancellationToken,
) -> Result<RenderCacheItem, RenderError> {
    let start = Instant::now();
    cancel.check()?;

    let includes = IncludeContext::new(request.include_base().map(Path::to_path_buf))
        .with_include_dirs(&options.include_dirs);
    let fragments = split_pages(request.source());
    let strategy = select_strategy(&fragments, &options.partial_marker);
    tracing::debug!(
        fragments = fragments.len(),
        ?strategy,
        has_previous = previous.is_some(),
        "Rendering document"
    );

    let ctx = RenderContext {
        engine,
        request,
        includes: &includes,
        cancel,
        start,
    };
    let item = match strategy {
        RenderStrategy::Normal => normal::render(&ctx, fragments, previous)?,
        RenderStrategy::Partial => partial::render(&ctx, fragments, previous)?,
    };

    let stats = item.result().stats();
    tracing::debug!(
        ?strategy,
        page_count = item.result().page_count(),
        rendered_fragments = stats.rendered_fragments,
        reused_fragments = stats.reused_fragments,
        encoded_pages = stats.encoded_pages,
        elapsed_ms = elapsed_ms(start),
        "Render complete"
    );
    Ok(item)
}

/// State of one render call, shared by both strategies.
pub(crate) struct RenderContext<'a> {
    engine: &'a dyn DiagramEngine,
    pub(crate) request: &'a RenderRequest,
    pub(crate) includes: &'a IncludeContext,
    pub(crate) cancel: &'a CancellationToken,
    start: Instant,
}

impl RenderContext<'_> {
    /// Parse `source` and apply the request zoom to each diagram.
    pub(crate) fn parse(&self, source: &str) -> Result<Vec<Diagram>, RenderError> {
        self.cancel.check()?;
        let blocks = self.engine.parse(source, self.includes)?;

        let mut diagrams = Vec::with_capacity(blocks.len());
        for block in blocks {
            self.cancel.check()?;
            let mut diagram = block.into_diagram();
            apply_zoom(&mut diagram, self.request.zoom_percent());
            diagrams.push(diagram);
        }
        Ok(diagrams)
    }

    /// Encode page `index` of `diagram`, resampled to the requested width.
    pub(crate) fn encode(&self, diagram: &Diagram, index: usize) -> Result<PageImage, RenderError> {
        self.cancel.check()?;
        let format = self.request.image_format();
        let mut bytes = diagram.render_page(index, format)?;
        if let Some(width) = self.request.target_width() {
            bytes = fit_width(bytes, format, width)?;
        }
        Ok(Arc::from(bytes))
    }

    /// Time since the render started.
    pub(crate) fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}

/// Renders documents and keeps the last result of each.
///
/// # Example
///
/// ```ignore
/// let renderer = Renderer::new(engine);
/// let cancel = CancellationToken::new();
/// let result = renderer.render("docs/flow.puml", &RenderRequest::new(source), &cancel)?;
/// println!("{} pages", result.page_count());
/// ```
#[derive(Debug)]
pub struct Renderer<E> {
    engine: E,
    options: RenderOptions,
    cache: RenderCache,
}

impl<E: DiagramEngine> Renderer<E> {
    /// Create a renderer with default options and an empty cache.
    #[must_use]
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            options: RenderOptions::default(),
            cache: RenderCache::new(),
        }
    }

    /// Replace the render options.
    #[must_use]
    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// The diagram engine.
    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The render options.
    #[must_use]
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// The render cache.
    #[must_use]
    pub fn cache(&self) -> &RenderCache {
        &self.cache
    }

    /// Render `document` and replace its cache entry on success.
    ///
    /// On error the previous entry stays in place, so a cancelled or failed
    /// render never costs the next one its reusable pages.
    ///
    /// # Errors
    ///
    /// See [`render`].
    pub fn render(
        &self,
        document: &str,
        request: &RenderRequest,
        cancel: &CancellationToken,
    ) -> Result<Arc<RenderResult>, RenderError> {
        let start = Instant::now();
        let previous = self.cache.get(document);

        let item = match render(
            &self.engine,
            &self.options,
            request,
            previous.as_deref(),
            cancel,
        ) {
            Ok(item) => item,
            Err(e) => {
                if e.is_cancelled() {
                    tracing::debug!(document, "Render cancelled");
                } else {
                    tracing::warn!(document, error = %e, "Render failed");
                }
                return Err(e);
            }
        };

        let result = Arc::clone(item.result());
        self.cache.insert(document, item);
        tracing::info!(
            document,
            strategy = ?result.strategy(),
            page_count = result.page_count(),
            elapsed_ms = elapsed_ms(start),
            "Rendered"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umlpage_engine::MockEngine;

    #[test]
    fn test_select_strategy_first_fragment_only() {
        let marker = DEFAULT_PARTIAL_MARKER;
        let partial = split_pages("' idea.partialRender\nA\nnewpage\nB");
        assert_eq!(select_strategy(&partial, marker), RenderStrategy::Partial);

        let later = split_pages("A\nnewpage\n' idea.partialRender\nB");
        assert_eq!(select_strategy(&later, marker), RenderStrategy::Normal);

        let plain = split_pages("A");
        assert_eq!(select_strategy(&plain, marker), RenderStrategy::Normal);
    }

    #[test]
    fn test_select_strategy_custom_and_empty_marker() {
        let fragments = split_pages("!incremental\nA");
        assert_eq!(
            select_strategy(&fragments, "!incremental"),
            RenderStrategy::Partial
        );
        assert_eq!(select_strategy(&fragments, ""), RenderStrategy::Normal);
    }

    #[test]
    fn test_renderer_keeps_cache_on_error() {
        let renderer = Renderer::new(MockEngine::new());
        let cancel = CancellationToken::new();
        renderer
            .render("doc", &RenderRequest::new("A"), &cancel)
            .unwrap();
        let before = renderer.cache().get("doc").unwrap();

        let err = renderer
            .render("doc", &RenderRequest::new("A\n!fail-parse"), &cancel)
            .unwrap_err();
        assert!(matches!(err, RenderError::Parse(_)));
        assert!(Arc::ptr_eq(&before, &renderer.cache().get("doc").unwrap()));
    }

    #[test]
    fn test_renderer_reuses_cached_pages() {
        let renderer = Renderer::new(MockEngine::new());
        let cancel = CancellationToken::new();
        let source = "' idea.partialRender\nA\nnewpage\nB";

        renderer
            .render("doc", &RenderRequest::new(source), &cancel)
            .unwrap();
        renderer.engine().reset_counts();
        let result = renderer
            .render("doc", &RenderRequest::new(source), &cancel)
            .unwrap();

        assert_eq!(renderer.engine().parse_count(), 0);
        assert_eq!(result.stats().reused_fragments, 2);
    }

    #[test]
    fn test_renderer_documents_are_independent() {
        let renderer = Renderer::new(MockEngine::new());
        let cancel = CancellationToken::new();
        let source = "' idea.partialRender\nA";

        renderer
            .render("one", &RenderRequest::new(source), &cancel)
            .unwrap();
        renderer.engine().reset_counts();
        renderer
            .render("two", &RenderRequest::new(source), &cancel)
            .unwrap();

        assert_eq!(renderer.engine().parse_count(), 1);
        assert_eq!(renderer.cache().len(), 2);
    }

    #[test]
    fn test_renderer_keeps_cache_on_cancel() {
        let renderer = Renderer::new(MockEngine::new());
        renderer
            .render("doc", &RenderRequest::new("A"), &CancellationToken::new())
            .unwrap();
        let before = renderer.cache().get("doc").unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = renderer
            .render("doc", &RenderRequest::new("B"), &cancel)
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(Arc::ptr_eq(&before, &renderer.cache().get("doc").unwrap()));
    }

    #[test]
    fn test_cancelled_first_render_leaves_cache_empty() {
        let renderer = Renderer::new(MockEngine::new());
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(
            renderer
                .render("doc", &RenderRequest::new("A"), &cancel)
                .is_err()
        );
        assert!(renderer.cache().is_empty());
        assert_eq!(renderer.engine().parse_count(), 0);
    }

    #[test]
    fn test_renderer_options() {
        let options = RenderOptions {
            partial_marker: "!incremental".to_owned(),
            include_dirs: vec![PathBuf::from("/shared")],
        };
        let renderer = Renderer::new(MockEngine::new()).with_options(options.clone());
        assert_eq!(renderer.options(), &options);

        let result = renderer
            .render(
                "doc",
                &RenderRequest::new("!incremental\nA"),
                &CancellationToken::new(),
            )
            .unwrap();
        assert_eq!(result.strategy(), RenderStrategy::Partial);
    }
}

//! Whole-document rendering.

use crate::cache::RenderCacheItem;
use crate::error::RenderError;
use crate::renderer::RenderContext;
use crate::result::{RenderResult, RenderStats, RenderStrategy};
use crate::splitter::PageFragment;
use crate::titles::extract_titles;

/// Render the whole source in one engine pass.
///
/// `previous` is never reused; it only decides whether a single-page request
/// may skip the other pages.
pub(crate) fn render(
    ctx: &RenderContext<'_>,
    fragments: Vec<PageFragment>,
    previous: Option<&RenderCacheItem>,
) -> Result<RenderCacheItem, RenderError> {
    let diagrams = ctx.parse(ctx.request.source())?;
    let titles = extract_titles(&diagrams);

    let total = titles.len();
    let wanted = ctx
        .request
        .selection()
        .pages_to_encode(total, previous.map(|p| p.result().page_count()));

    let mut images = Vec::with_capacity(total);
    for diagram in &diagrams {
        for local in 0..diagram.page_count() {
            let image = if wanted[images.len()] {
                Some(ctx.encode(diagram, local)?)
            } else {
                None
            };
            images.push(image);
        }
    }

    let stats = RenderStats {
        fragments: fragments.len(),
        rendered_fragments: fragments.len(),
        reused_fragments: 0,
        encoded_pages: images.iter().flatten().count(),
        elapsed: ctx.elapsed(),
    };
    let result = RenderResult::new(RenderStrategy::Normal, titles, images, stats);
    Ok(RenderCacheItem::new(
        ctx.request.clone(),
        ctx.includes.clone(),
        fragments,
        Vec::new(),
        result,
    ))
}

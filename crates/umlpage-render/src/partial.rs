//! Page-by-page rendering with reuse.
//!
//! Each fragment is rendered as a standalone document. A fragment whose text
//! and opening title match the fragment at the same position in the previous
//! render reuses that fragment's diagrams, titles and images without a
//! re-parse. Matching is positional, and any change in the number of
//! fragments discards the previous render entirely.

use std::borrow::Cow;
use std::sync::Arc;

use umlpage_engine::Diagram;

use crate::cache::{FragmentRender, RenderCacheItem};
use crate::error::RenderError;
use crate::renderer::RenderContext;
use crate::result::{RenderResult, RenderStats, RenderStrategy};
use crate::splitter::PageFragment;
use crate::titles::{Titles, push_diagram_titles};

/// Why a previous render cannot be reused at all.
#[derive(Debug, thiserror::Error)]
enum CacheInconsistency {
    #[error("fragment count changed from {previous} to {current}")]
    FragmentCountChanged { previous: usize, current: usize },
    #[error("include directories changed")]
    IncludesChanged,
    #[error("previous render was not partial")]
    NotPartial,
    #[error("zoom, format or width changed")]
    OutputChanged,
}

/// Check whether `previous` can serve as a reuse source for `fragments`.
fn check_previous(
    ctx: &RenderContext<'_>,
    fragments: &[PageFragment],
    previous: &RenderCacheItem,
) -> Result<(), CacheInconsistency> {
    if !previous.is_partial() {
        return Err(CacheInconsistency::NotPartial);
    }
    if fragments.len() != previous.fragments().len() {
        return Err(CacheInconsistency::FragmentCountChanged {
            previous: previous.fragments().len(),
            current: fragments.len(),
        });
    }
    if !ctx.request.same_output(previous.request()) {
        return Err(CacheInconsistency::OutputChanged);
    }
    if ctx.includes != previous.includes() {
        return Err(CacheInconsistency::IncludesChanged);
    }
    Ok(())
}

/// Wrap a fragment in `@startuml`/`@enduml` when it lacks them.
fn standalone(text: &str) -> Cow<'_, str> {
    let has = |prefix: &str| text.lines().any(|l| l.trim_start().starts_with(prefix));
    let (has_start, has_end) = (has("@start"), has("@end"));
    if has_start && has_end {
        return Cow::Borrowed(text);
    }

    let mut doc = String::with_capacity(text.len() + 20);
    if !has_start {
        doc.push_str("@startuml\n");
    }
    doc.push_str(text);
    if !has_end {
        doc.push_str("\n@enduml");
    }
    Cow::Owned(doc)
}

/// A fragment after phase one: diagrams and titles known, images pending.
enum Part {
    Reused(Arc<FragmentRender>),
    Fresh {
        diagrams: Arc<[Diagram]>,
        titles: Vec<Option<String>>,
    },
}

impl Part {
    fn diagrams(&self) -> &[Diagram] {
        match self {
            Self::Reused(render) => render.diagrams(),
            Self::Fresh { diagrams, .. } => diagrams,
        }
    }

    fn titles(&self) -> &[Option<String>] {
        match self {
            Self::Reused(render) => render.titles(),
            Self::Fresh { titles, .. } => titles,
        }
    }
}

/// Parse one fragment and collect its titles.
fn render_fragment(
    ctx: &RenderContext<'_>,
    index: usize,
    fragment: &PageFragment,
) -> Result<Part, RenderError> {
    let diagrams = ctx.parse(&standalone(fragment.text()))?;

    let mut titles = Vec::new();
    for diagram in &diagrams {
        push_diagram_titles(diagram, &mut titles);
    }
    if index > 0
        && let Some(first) = titles.first_mut()
        && first.is_none()
    {
        *first = fragment.break_title().map(str::to_owned);
    }

    Ok(Part::Fresh {
        diagrams: diagrams.into(),
        titles,
    })
}

pub(crate) fn render(
    ctx: &RenderContext<'_>,
    fragments: Vec<PageFragment>,
    previous: Option<&RenderCacheItem>,
) -> Result<RenderCacheItem, RenderError> {
    let reusable = previous.filter(|prev| match check_previous(ctx, &fragments, prev) {
        Ok(()) => true,
        Err(reason) => {
            tracing::debug!(%reason, "Discarding previous render");
            false
        }
    });

    // Phase one: diagrams and titles for every fragment.
    let mut parts = Vec::with_capacity(fragments.len());
    let mut reused_fragments = 0;
    for (index, fragment) in fragments.iter().enumerate() {
        ctx.cancel.check()?;
        let cached = reusable.and_then(|prev| {
            let old = prev.fragments().get(index)?;
            let render = prev.fragment_renders().get(index)?;
            old.same_content(fragment).then(|| Arc::clone(render))
        });
        let part = match cached {
            Some(render) => {
                reused_fragments += 1;
                Part::Reused(render)
            }
            None => render_fragment(ctx, index, fragment)?,
        };
        parts.push(part);
    }

    let titles: Titles = parts
        .iter()
        .flat_map(|part| part.titles().iter().cloned())
        .collect();

    // Phase two: images for the wanted pages, reusing cached ones.
    let total = titles.len();
    let wanted = ctx
        .request
        .selection()
        .pages_to_encode(total, previous.map(|p| p.result().page_count()));

    let mut images = Vec::with_capacity(total);
    let mut renders = Vec::with_capacity(parts.len());
    let mut encoded_pages = 0;
    for part in parts {
        let mut part_images = match &part {
            Part::Reused(render) => render.images().to_vec(),
            Part::Fresh { titles, .. } => vec![None; titles.len()],
        };

        let mut slot = 0;
        let mut encoded_here = 0;
        for diagram in part.diagrams() {
            for local in 0..diagram.page_count() {
                if wanted[images.len() + slot] && part_images[slot].is_none() {
                    part_images[slot] = Some(ctx.encode(diagram, local)?);
                    encoded_here += 1;
                }
                slot += 1;
            }
        }
        encoded_pages += encoded_here;
        images.extend(part_images.iter().cloned());

        let render = match part {
            Part::Reused(render) if encoded_here == 0 => render,
            Part::Reused(render) => Arc::new(FragmentRender::new(
                Arc::clone(render.diagrams()),
                render.titles().to_vec(),
                part_images,
            )),
            Part::Fresh { diagrams, titles } => {
                Arc::new(FragmentRender::new(diagrams, titles, part_images))
            }
        };
        renders.push(render);
    }

    let stats = RenderStats {
        fragments: fragments.len(),
        rendered_fragments: fragments.len() - reused_fragments,
        reused_fragments,
        encoded_pages,
        elapsed: ctx.elapsed(),
    };
    let result = RenderResult::new(RenderStrategy::Partial, titles, images, stats);
    Ok(RenderCacheItem::new(
        ctx.request.clone(),
        ctx.includes.clone(),
        fragments,
        renders,
        result,
    ))
}

//! Incremental page rendering for diagram documents.
//!
//! A document is split into logical pages on `newpage` lines. Each render
//! produces per-page titles, the total page count and the requested page
//! images. Documents whose first page contains the partial-render marker are
//! rendered page by page, and pages that did not change since the previous
//! render are reused instead of being parsed again.
//!
//! # Architecture
//!
//! - [`splitter`]: cuts a source into [`PageFragment`]s
//! - [`renderer`]: strategy selection, [`render`] and the caching [`Renderer`]
//! - `normal` / `partial`: the two render strategies
//! - [`scale`]: zoom to scale factor, applied once per diagram
//! - [`titles`]: per-page title extraction
//! - [`cache`]: last render per document
//! - [`resize`]: raster page resampling
//! - [`save`]: render straight to files
//!
//! # Example
//!
//! ```ignore
//! use umlpage_render::{CancellationToken, RenderRequest, Renderer};
//!
//! let renderer = Renderer::new(engine);
//! let request = RenderRequest::new(source).base_dir("docs").zoom(150);
//! let result = renderer.render("docs/flow.puml", &request, &CancellationToken::new())?;
//! for (page, title) in result.titles().iter().enumerate() {
//!     println!("{page}: {}", title.unwrap_or("(untitled)"));
//! }
//! ```

pub mod cache;
mod cancel;
mod consts;
mod error;
mod normal;
mod partial;
pub mod renderer;
mod request;
pub mod resize;
mod result;
pub mod save;
pub mod scale;
pub mod splitter;
pub mod titles;

pub use cache::{FragmentRender, RenderCache, RenderCacheItem};
pub use cancel::CancellationToken;
pub use consts::{DEFAULT_PARTIAL_MARKER, DEFAULT_ZOOM};
pub use error::RenderError;
pub use renderer::{RenderOptions, Renderer, render, select_strategy};
pub use request::{PageSelection, RenderRequest};
pub use result::{PageImage, RenderResult, RenderStats, RenderStrategy};
pub use save::{OutputNaming, render_and_save, save_pages};
pub use splitter::{PageBreak, PageFragment, split_pages};
pub use titles::{Titles, extract_titles};

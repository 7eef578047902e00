//! Kroki-backed diagram engine for umlpage.
//!
//! [`KrokiEngine`] implements [`DiagramEngine`](umlpage_engine::DiagramEngine)
//! on top of a [Kroki](https://kroki.io) server:
//! - `!include` lines are inlined from the render's include context
//! - `@start…`/`@end…` blocks become diagrams; `newpage` lines make pages
//! - each page is posted to the server's `PlantUML` endpoint when encoded,
//!   with the display scale injected after the `@start…` line

mod block;
mod client;
mod consts;
mod engine;
mod include;

pub use client::create_agent;
pub use consts::DEFAULT_TIMEOUT;
pub use engine::KrokiEngine;
pub use include::{Resolved, resolve_includes};

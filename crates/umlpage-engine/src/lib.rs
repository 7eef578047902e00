//! Diagram engine boundary for umlpage.
//!
//! The render orchestration layer never parses or lays out diagrams itself.
//! It talks to a [`DiagramEngine`] through the types in this crate:
//!
//! - [`DiagramEngine`] parses a document into [`Block`]s
//! - [`Diagram`] carries a [`DiagramKind`] (titles and set-once scale) and
//!   encodes page images through an engine-provided [`PageSource`]
//! - [`IncludeContext`] tells the engine where `!include` paths are resolved
//! - [`MockEngine`] is a scripted in-memory engine for tests (behind the `mock` feature)
//!
//! # Example
//!
//! ```ignore
//! use umlpage_engine::{DiagramEngine, ImageFormat, IncludeContext};
//!
//! let context = IncludeContext::new(Some("docs".into()));
//! let blocks = engine.parse("@startuml\nA -> B\n@enduml", &context)?;
//! let png = blocks[0].diagram().render_page(0, ImageFormat::Png)?;
//! ```

mod diagram;
mod engine;
mod error;
mod format;
mod include;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use diagram::{Diagram, DiagramKind, PageDiagram, PageSource, Scale};
pub use engine::{Block, DiagramEngine};
pub use error::EngineError;
pub use format::{ImageFormat, UnknownFormat};
pub use include::IncludeContext;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockEngine;

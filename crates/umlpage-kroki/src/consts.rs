//! Internal constants for the Kroki engine.

use std::time::Duration;

/// Default HTTP timeout for Kroki requests (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Nested `!include` levels resolved before giving up.
pub const MAX_INCLUDE_DEPTH: usize = 10;

/// Kroki endpoint for every `@start…` block.
pub const PLANTUML_ENDPOINT: &str = "plantuml";

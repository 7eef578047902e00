//! Internal constants for page rendering.

/// Substring in the first page that opts a document into partial rendering.
pub const DEFAULT_PARTIAL_MARKER: &str = "idea.partialRender";

/// Zoom percentage that maps to a scale factor of 1.0.
pub const DEFAULT_ZOOM: u32 = 100;

/// Lower bound of the display scale factor (zoom below 100% never shrinks).
pub const MIN_SCALE: f64 = 1.0;

/// Upper bound of the display scale factor.
pub const MAX_SCALE: f64 = 2.0;

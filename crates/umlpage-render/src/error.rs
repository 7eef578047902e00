//! Render error types.

use umlpage_engine::EngineError;

/// Error surfaced by a render call.
///
/// Any error aborts the whole render: no partial result is returned and the
/// render cache keeps its previous entry.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The document source is malformed.
    #[error("{0}")]
    Parse(EngineError),
    /// Encoding, include resolution, image resampling or file output failed.
    #[error("{context}: {source}")]
    Io {
        /// What was being done when the failure happened.
        context: String,
        /// Underlying failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// The render was cancelled through its
    /// [`CancellationToken`](crate::CancellationToken).
    #[error("rendering cancelled")]
    Cancelled,
}

impl RenderError {
    /// Create an I/O error with context.
    pub fn io(
        context: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Io {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Whether the render was cancelled rather than failed.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<EngineError> for RenderError {
    fn from(err: EngineError) -> Self {
        if err.is_parse() {
            Self::Parse(err)
        } else {
            Self::io("diagram engine", err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_parse_error_stays_parse() {
        let err = RenderError::from(EngineError::parse_at(2, "bad arrow"));
        assert!(matches!(err, RenderError::Parse(_)));
        assert_eq!(err.to_string(), "parse error: bad arrow");
    }

    #[test]
    fn test_engine_output_error_becomes_io() {
        let err = RenderError::from(EngineError::Http("HTTP 502: bad gateway".to_owned()));
        assert!(matches!(err, RenderError::Io { .. }));
        assert_eq!(
            err.to_string(),
            "diagram engine: HTTP error: HTTP 502: bad gateway"
        );
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_cancelled_is_distinct() {
        assert!(RenderError::Cancelled.is_cancelled());
        assert_eq!(RenderError::Cancelled.to_string(), "rendering cancelled");
    }
}

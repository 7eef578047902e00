//! Engine error types.

/// Error raised by a [`DiagramEngine`](crate::DiagramEngine) or a
/// [`PageSource`](crate::PageSource).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Malformed diagram source.
    #[error("parse error: {message}")]
    Parse {
        /// 1-based source line, when the engine knows it.
        line: Option<usize>,
        /// Human readable description.
        message: String,
    },
    /// Image encoding or include resolution failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Remote engine transport failure.
    #[error("HTTP error: {0}")]
    Http(String),
    /// Requested page does not exist in the diagram.
    #[error("page {index} out of range (diagram has {count} pages)")]
    PageOutOfRange {
        /// Requested 0-based page.
        index: usize,
        /// Pages the diagram actually has.
        count: usize,
    },
}

impl EngineError {
    /// Create a parse error without line information.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            line: None,
            message: message.into(),
        }
    }

    /// Create a parse error pointing at a 1-based source line.
    pub fn parse_at(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line: Some(line),
            message: message.into(),
        }
    }

    /// Whether this error describes malformed source rather than a failed output.
    #[must_use]
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_constructors() {
        let err = EngineError::parse_at(3, "unexpected token");
        assert!(err.is_parse());
        assert_eq!(err.to_string(), "parse error: unexpected token");
        assert!(matches!(err, EngineError::Parse { line: Some(3), .. }));

        assert!(matches!(
            EngineError::parse("bad"),
            EngineError::Parse { line: None, .. }
        ));
    }

    #[test]
    fn test_output_errors_are_not_parse_errors() {
        let io = EngineError::from(std::io::Error::other("disk full"));
        assert!(!io.is_parse());
        assert!(!EngineError::Http("HTTP 500".to_owned()).is_parse());
        assert_eq!(
            EngineError::PageOutOfRange { index: 4, count: 2 }.to_string(),
            "page 4 out of range (diagram has 2 pages)"
        );
    }
}

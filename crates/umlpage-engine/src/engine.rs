//! Diagram engine trait.

use crate::diagram::Diagram;
use crate::error::EngineError;
use crate::include::IncludeContext;

/// One diagram block found in a document (`@startuml` … `@enduml`).
#[derive(Clone, Debug)]
pub struct Block {
    diagram: Diagram,
    start_line: usize,
}

impl Block {
    /// Create a block starting at 1-based `start_line` of the parsed text.
    #[must_use]
    pub fn new(diagram: Diagram, start_line: usize) -> Self {
        Self {
            diagram,
            start_line,
        }
    }

    /// The block's diagram.
    #[must_use]
    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    /// 1-based line where the block starts.
    #[must_use]
    pub fn start_line(&self) -> usize {
        self.start_line
    }

    /// Take ownership of the diagram.
    #[must_use]
    pub fn into_diagram(self) -> Diagram {
        self.diagram
    }
}

/// Parser and layout engine for diagram documents.
///
/// Implementations must be safe to share across threads; the orchestration
/// layer never calls one concurrently for the same document, but distinct
/// documents may render in parallel.
pub trait DiagramEngine: Send + Sync {
    /// Parse `source` into diagram blocks.
    ///
    /// `includes` is only valid for the duration of this call.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Parse`] for malformed source and
    /// [`EngineError::Io`] when an include cannot be read.
    fn parse(&self, source: &str, includes: &IncludeContext) -> Result<Vec<Block>, EngineError>;
}

impl<E: DiagramEngine + ?Sized> DiagramEngine for &E {
    fn parse(&self, source: &str, includes: &IncludeContext) -> Result<Vec<Block>, EngineError> {
        (**self).parse(source, includes)
    }
}

impl<E: DiagramEngine + ?Sized> DiagramEngine for Box<E> {
    fn parse(&self, source: &str, includes: &IncludeContext) -> Result<Vec<Block>, EngineError> {
        (**self).parse(source, includes)
    }
}

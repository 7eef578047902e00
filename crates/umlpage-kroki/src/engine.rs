//! [`DiagramEngine`] backed by a Kroki server.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use umlpage_engine::{
    Block, Diagram, DiagramEngine, DiagramKind, EngineError, ImageFormat, IncludeContext,
    PageSource,
};
use ureq::Agent;

use crate::block::{BlockSource, split_blocks};
use crate::client::{create_agent, send_diagram_request};
use crate::consts::{DEFAULT_TIMEOUT, PLANTUML_ENDPOINT};
use crate::include::resolve_includes;

/// Diagram engine that parses locally and lays out pages on a Kroki server.
///
/// Parsing only splits blocks, resolves includes and reads titles, page
/// breaks and declared scales; it never touches the network. Each page is
/// sent to the server when it is encoded.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use umlpage_kroki::KrokiEngine;
///
/// let engine = KrokiEngine::new("https://kroki.io").with_timeout(Duration::from_secs(10));
/// ```
#[derive(Clone)]
pub struct KrokiEngine {
    server_url: String,
    timeout: Duration,
    agent: Agent,
}

impl fmt::Debug for KrokiEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KrokiEngine")
            .field("server_url", &self.server_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl KrokiEngine {
    /// Create an engine for `server_url` with the default timeout.
    #[must_use]
    pub fn new(server_url: impl Into<String>) -> Self {
        let server_url = server_url.into().trim_end_matches('/').to_owned();
        Self {
            server_url,
            timeout: DEFAULT_TIMEOUT,
            agent: create_agent(DEFAULT_TIMEOUT),
        }
    }

    /// Set the HTTP timeout for page requests.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.agent = create_agent(timeout);
        self
    }

    /// Server URL without trailing slash.
    #[must_use]
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// HTTP timeout for page requests.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl DiagramEngine for KrokiEngine {
    fn parse(&self, source: &str, includes: &IncludeContext) -> Result<Vec<Block>, EngineError> {
        let resolved = resolve_includes(source, includes)?;
        let blocks = split_blocks(&resolved.source)?;
        tracing::debug!(
            blocks = blocks.len(),
            unresolved_includes = resolved.warnings.len(),
            "Parsed document"
        );

        Ok(blocks
            .into_iter()
            .map(|block| {
                let start_line = block.start_line;
                let kind = if block.page_breaks.is_empty() {
                    DiagramKind::Simple {
                        title: block.title.clone(),
                        scale: block.scale,
                    }
                } else {
                    DiagramKind::Sequence {
                        title: block.title.clone(),
                        page_breaks: block.page_breaks.clone(),
                        scale: block.scale,
                    }
                };
                let pages = KrokiPages {
                    block,
                    server_url: self.server_url.clone(),
                    agent: self.agent.clone(),
                };
                Block::new(Diagram::new(kind, Arc::new(pages)), start_line)
            })
            .collect())
    }
}

/// Page encoder for one block.
struct KrokiPages {
    block: BlockSource,
    server_url: String,
    agent: Agent,
}

impl fmt::Debug for KrokiPages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KrokiPages")
            .field("start_line", &self.block.start_line)
            .field("pages", &self.block.sections.len())
            .finish_non_exhaustive()
    }
}

impl PageSource for KrokiPages {
    fn render_page(
        &self,
        index: usize,
        scale: f64,
        format: ImageFormat,
    ) -> Result<Vec<u8>, EngineError> {
        let source = self.block.page_source(index, scale);
        let url = format!(
            "{}/{PLANTUML_ENDPOINT}/{}",
            self.server_url,
            format.extension()
        );
        tracing::trace!(url = %url, page = index, "Requesting page");
        send_diagram_request(&self.agent, &url, &source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_trims_trailing_slash() {
        let engine = KrokiEngine::new("https://kroki.io/");
        assert_eq!(engine.server_url(), "https://kroki.io");
        assert_eq!(engine.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(
            engine.with_timeout(Duration::from_secs(5)).timeout(),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn test_parse_is_local() {
        let engine = KrokiEngine::new("http://127.0.0.1:1");
        let blocks = engine
            .parse(
                "@startuml\ntitle Flow\nA -> B\nnewpage Next\nB -> A\n@enduml",
                &IncludeContext::default(),
            )
            .unwrap();

        assert_eq!(blocks.len(), 1);
        assert_eq!(
            blocks[0].diagram().kind(),
            &DiagramKind::Sequence {
                title: Some("Flow".to_owned()),
                page_breaks: vec![Some("Next".to_owned())],
                scale: umlpage_engine::Scale::unset(),
            }
        );
    }

    #[test]
    fn test_parse_error_from_unclosed_block() {
        let engine = KrokiEngine::new("http://127.0.0.1:1");
        let err = engine
            .parse("@startuml\nA -> B", &IncludeContext::default())
            .unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_unreachable_server_is_http_error() {
        let engine = KrokiEngine::new("http://127.0.0.1:1").with_timeout(Duration::from_secs(2));
        let blocks = engine.parse("A -> B", &IncludeContext::default()).unwrap();
        let err = blocks[0]
            .diagram()
            .render_page(0, ImageFormat::Svg)
            .unwrap_err();
        assert!(matches!(err, EngineError::Http(_)));
    }
}

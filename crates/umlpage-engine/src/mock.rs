//! Mock engine implementation for testing.
//!
//! Provides [`MockEngine`], a deterministic engine driven by a tiny line-based
//! language, so render orchestration can be tested without a real diagram
//! layout engine.
//!
//! # Language
//!
//! Blocks are delimited by `@start…`/`@end…` lines; text without any `@start`
//! line is a single block. Inside a block:
//!
//! | line | effect |
//! |---|---|
//! | `title X` | diagram title |
//! | `scale N` | scale declared by the source |
//! | `newpage [X]` / `@newpage [X]` | sequence diagram page break |
//! | `!paged` | paged container; each `page [X]` line opens a page |
//! | `!error [X]` | error diagram |
//! | `!fail-parse` | `parse` fails at this line |
//! | `!fail-render` | encoding any page of this diagram fails |
//!
//! Encoded pages are UTF-8 text `"{kind}:{page}:{scale}:{format}"`.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::diagram::{Diagram, DiagramKind, PageDiagram, PageSource, Scale};
use crate::engine::{Block, DiagramEngine};
use crate::error::EngineError;
use crate::format::ImageFormat;
use crate::include::IncludeContext;

type ParseHook = Box<dyn Fn(usize) + Send + Sync>;

/// Scripted in-memory engine.
///
/// # Example
///
/// ```ignore
/// use umlpage_engine::{DiagramEngine, IncludeContext, MockEngine};
///
/// let engine = MockEngine::new();
/// let blocks = engine.parse("title Intro\nA -> B", &IncludeContext::default()).unwrap();
/// assert_eq!(engine.parse_count(), 1);
/// ```
#[derive(Default)]
pub struct MockEngine {
    parse_calls: AtomicUsize,
    render_calls: Arc<AtomicUsize>,
    parsed_sources: Mutex<Vec<String>>,
    base_dirs: Mutex<Vec<Option<PathBuf>>>,
    parse_hook: Option<ParseHook>,
}

impl std::fmt::Debug for MockEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockEngine")
            .field("parse_calls", &self.parse_count())
            .field("render_calls", &self.render_count())
            .finish_non_exhaustive()
    }
}

impl MockEngine {
    /// Create a new mock engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `hook` before every `parse`, with the 0-based call number.
    ///
    /// Useful for cancelling a render from inside the engine.
    #[must_use]
    pub fn with_parse_hook(mut self, hook: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.parse_hook = Some(Box::new(hook));
        self
    }

    /// Number of `parse` calls so far.
    #[must_use]
    pub fn parse_count(&self) -> usize {
        self.parse_calls.load(Ordering::SeqCst)
    }

    /// Number of pages encoded so far.
    #[must_use]
    pub fn render_count(&self) -> usize {
        self.render_calls.load(Ordering::SeqCst)
    }

    /// Every source passed to `parse`, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn parsed_sources(&self) -> Vec<String> {
        self.parsed_sources.lock().unwrap().clone()
    }

    /// Base directory of every include context seen, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn seen_base_dirs(&self) -> Vec<Option<PathBuf>> {
        self.base_dirs.lock().unwrap().clone()
    }

    /// Forget recorded calls.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn reset_counts(&self) {
        self.parse_calls.store(0, Ordering::SeqCst);
        self.render_calls.store(0, Ordering::SeqCst);
        self.parsed_sources.lock().unwrap().clear();
        self.base_dirs.lock().unwrap().clear();
    }

    fn parse_block(&self, lines: &[(usize, &str)], start_line: usize) -> Result<Block, EngineError> {
        let mut title = None;
        let mut scale = Scale::unset();
        let mut page_breaks = Vec::new();
        let mut paged: Option<Vec<PageDiagram>> = None;
        let mut error: Option<Option<String>> = None;
        let mut fail_render = false;

        for &(line_no, raw) in lines {
            let line = raw.trim();
            if line == "!fail-parse" {
                return Err(EngineError::parse_at(line_no, "scripted parse failure"));
            } else if line == "!fail-render" {
                fail_render = true;
            } else if line == "!paged" {
                paged.get_or_insert_with(Vec::new);
            } else if let Some(rest) = directive(line, "!error") {
                error = Some(rest);
            } else if let Some(rest) = directive(line, "title") {
                title = rest;
            } else if let Some(rest) = directive(line, "scale") {
                let factor = rest
                    .as_deref()
                    .and_then(|s| s.parse::<f64>().ok())
                    .ok_or_else(|| EngineError::parse_at(line_no, "invalid scale"))?;
                scale = Scale::declared(factor);
            } else if let Some(pages) = paged.as_mut()
                && let Some(rest) = directive(line, "page")
            {
                pages.push(PageDiagram::new(rest));
            } else if let Some(rest) = directive(line.trim_start_matches('@'), "newpage") {
                page_breaks.push(rest);
            }
        }

        let (kind, label) = if let Some(title) = error {
            (DiagramKind::Error { title }, "error")
        } else if let Some(pages) = paged {
            (DiagramKind::Paged { pages }, "paged")
        } else if page_breaks.is_empty() {
            (DiagramKind::Simple { title, scale }, "simple")
        } else {
            (
                DiagramKind::Sequence {
                    title,
                    page_breaks,
                    scale,
                },
                "sequence",
            )
        };

        let pages = MockPages {
            label,
            fail: fail_render,
            render_calls: Arc::clone(&self.render_calls),
        };
        Ok(Block::new(Diagram::new(kind, Arc::new(pages)), start_line))
    }
}

impl DiagramEngine for MockEngine {
    fn parse(&self, source: &str, includes: &IncludeContext) -> Result<Vec<Block>, EngineError> {
        let call = self.parse_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(hook) = &self.parse_hook {
            hook(call);
        }
        self.parsed_sources.lock().unwrap().push(source.to_owned());
        self.base_dirs
            .lock()
            .unwrap()
            .push(includes.base_dir().map(std::path::Path::to_path_buf));

        split_blocks(source)
            .into_iter()
            .map(|(start, lines)| self.parse_block(&lines, start))
            .collect()
    }
}

/// Match `keyword` at the start of `line` (case-insensitive), returning the
/// trimmed remainder (`None` when empty).
fn directive(line: &str, keyword: &str) -> Option<Option<String>> {
    let head = line.get(..keyword.len())?;
    if !head.eq_ignore_ascii_case(keyword) {
        return None;
    }
    let rest = &line[keyword.len()..];
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }
    let rest = rest.trim();
    Some((!rest.is_empty()).then(|| rest.to_owned()))
}

/// Split text into `(start_line, lines)` blocks on `@start`/`@end` lines.
fn split_blocks(source: &str) -> Vec<(usize, Vec<(usize, &str)>)> {
    let numbered: Vec<(usize, &str)> = source.lines().enumerate().map(|(i, l)| (i + 1, l)).collect();
    if !numbered.iter().any(|(_, l)| l.trim_start().starts_with("@start")) {
        return vec![(1, numbered)];
    }

    let mut blocks = Vec::new();
    let mut current: Option<(usize, Vec<(usize, &str)>)> = None;
    for (line_no, line) in numbered {
        let trimmed = line.trim_start();
        if trimmed.starts_with("@start") {
            current = Some((line_no, Vec::new()));
        } else if trimmed.starts_with("@end") {
            blocks.extend(current.take());
        } else if let Some((_, lines)) = current.as_mut() {
            lines.push((line_no, line));
        }
    }
    blocks.extend(current);
    blocks
}

#[derive(Debug)]
struct MockPages {
    label: &'static str,
    fail: bool,
    render_calls: Arc<AtomicUsize>,
}

impl PageSource for MockPages {
    fn render_page(
        &self,
        index: usize,
        scale: f64,
        format: ImageFormat,
    ) -> Result<Vec<u8>, EngineError> {
        self.render_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(EngineError::Io(std::io::Error::other(
                "scripted encoder failure",
            )));
        }
        Ok(format!("{}:{index}:{scale}:{format}", self.label).into_bytes())
    }
}

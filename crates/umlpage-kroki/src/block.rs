//! Block splitting and page layout of `PlantUML` sources.
//!
//! A document holds one or more `@start…`/`@end…` blocks. Each block becomes
//! one diagram. A block with `newpage` lines is a sequence diagram: its page
//! `i` is rendered from the block's declarations followed by the `i`-th
//! section between page breaks, so the server only lays out that page.

use std::sync::LazyLock;

use regex::Regex;
use umlpage_engine::{EngineError, Scale};

static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*title[ \t]+(.+?)\s*$").unwrap());

static SCALE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*scale[ \t]+(\S.*?)\s*$").unwrap());

static NEWPAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*@?newpage(?:[ \t]+(.*?))?\s*$").unwrap());

/// Lines carried onto every page of a sequence diagram.
static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(participant|actor|boundary|control|entity|database|collections|queue|skinparam|hide|show|autonumber|!theme|!define|!pragma)\b",
    )
    .unwrap()
});

/// One `@start…`/`@end…` block, split into pages.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockSource {
    /// 1-based line of the `@start…` directive.
    pub start_line: usize,
    /// The `@start…` line.
    pub start: String,
    /// The `@end…` line.
    pub end: String,
    /// Title declared by the block.
    pub title: Option<String>,
    /// Scale declared by the block.
    pub scale: Scale,
    /// Declarations repeated on every page.
    pub header: Vec<String>,
    /// Body lines of each page; more than one for sequence diagrams.
    pub sections: Vec<Vec<String>>,
    /// Title of each page break, in order.
    pub page_breaks: Vec<Option<String>>,
}

impl BlockSource {
    /// Source text for page `index`, with `scale` injected when not 1.0 and
    /// not already declared by the block.
    #[must_use]
    pub fn page_source(&self, index: usize, scale: f64) -> String {
        let mut out = String::new();
        out.push_str(&self.start);
        out.push('\n');
        if self.scale.get().is_none() && (scale - 1.0).abs() > f64::EPSILON {
            out.push_str(&format!("scale {scale}\n"));
        }
        if index > 0 {
            for line in &self.header {
                out.push_str(line);
                out.push('\n');
            }
        }
        for line in self.sections.get(index).into_iter().flatten() {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(&self.end);
        out
    }
}

/// Split `source` into blocks.
///
/// Text without any `@start` line is treated as a single `@startuml` block.
///
/// # Errors
///
/// Returns [`EngineError::Parse`] when a block is never closed.
pub fn split_blocks(source: &str) -> Result<Vec<BlockSource>, EngineError> {
    let lines: Vec<&str> = source.lines().collect();
    if !lines.iter().any(|l| l.trim_start().starts_with("@start")) {
        return Ok(vec![analyze(1, "@startuml", "@enduml", &lines)]);
    }

    let mut blocks = Vec::new();
    let mut open: Option<(usize, &str)> = None;
    let mut body: Vec<&str> = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.starts_with("@start") {
            open = Some((i + 1, trimmed));
            body.clear();
        } else if trimmed.starts_with("@end") {
            if let Some((start_line, start)) = open.take() {
                blocks.push(analyze(start_line, start, trimmed, &body));
            }
        } else if open.is_some() {
            body.push(line);
        }
    }
    if let Some((start_line, start)) = open {
        return Err(EngineError::parse_at(
            start_line,
            format!("'{start}' has no matching @end"),
        ));
    }
    Ok(blocks)
}

/// Factor of a `scale` directive.
///
/// Plain numbers and `a/b` fractions are factors. Size forms such as
/// `200 width` or `max 300*200` still count as declared, with factor 1.0.
fn declared_factor(spec: &str) -> f64 {
    if let Ok(factor) = spec.parse::<f64>() {
        return factor;
    }
    if let Some((num, den)) = spec.split_once('/')
        && let (Ok(num), Ok(den)) = (num.trim().parse::<f64>(), den.trim().parse::<f64>())
        && den > 0.0
    {
        return num / den;
    }
    1.0
}

fn analyze(start_line: usize, start: &str, end: &str, body: &[&str]) -> BlockSource {
    let mut title = None;
    let mut scale = Scale::unset();
    let mut header = Vec::new();
    let mut sections = vec![Vec::new()];
    let mut page_breaks = Vec::new();
    let mut in_header_block = false;

    for &line in body {
        if let Some(caps) = NEWPAGE.captures(line) {
            let break_title = caps
                .get(1)
                .map(|t| t.as_str().trim())
                .filter(|t| !t.is_empty())
                .map(str::to_owned);
            page_breaks.push(break_title);
            sections.push(Vec::new());
            continue;
        }

        if title.is_none()
            && let Some(caps) = TITLE.captures(line)
        {
            title = caps.get(1).map(|t| t.as_str().to_owned());
        }
        if let Some(caps) = SCALE.captures(line) {
            scale = Scale::declared(declared_factor(&caps[1]));
        }

        // Declarations of the first page, including `{ … }` bodies.
        if page_breaks.is_empty() && (in_header_block || DECLARATION.is_match(line)) {
            header.push(line.to_owned());
            let trimmed = line.trim_end();
            if trimmed.ends_with('{') {
                in_header_block = true;
            } else if trimmed.trim_start() == "}" {
                in_header_block = false;
            }
        }

        if let Some(section) = sections.last_mut() {
            section.push(line.to_owned());
        }
    }

    BlockSource {
        start_line,
        start: start.to_owned(),
        end: end.to_owned(),
        title,
        scale,
        header,
        sections,
        page_breaks,
    }
}

//! `!include` resolution.
//!
//! Include lines are replaced by the file they name, found through the
//! render's [`IncludeContext`]. Stdlib includes (`!include <…>`) are left for
//! the server. Unresolved includes are kept as-is and reported as warnings so
//! the server can render its own error for them.

use std::sync::LazyLock;

use regex::Regex;
use umlpage_engine::{EngineError, IncludeContext};

use crate::consts::MAX_INCLUDE_DEPTH;

static INCLUDE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^([ \t]*)!include(?:_once)?[ \t]+(.+?)[ \t]*\r?$").unwrap());

/// Source with includes inlined, plus what could not be resolved.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Resolved {
    /// Source with every resolvable include inlined.
    pub source: String,
    /// Human readable notes about includes left in place.
    pub warnings: Vec<String>,
}

/// Inline every resolvable `!include` in `source`.
///
/// # Errors
///
/// Returns [`EngineError::Io`] when a resolved include file cannot be read.
pub fn resolve_includes(source: &str, includes: &IncludeContext) -> Result<Resolved, EngineError> {
    let mut warnings = Vec::new();
    let source = resolve(source, includes, 0, &mut warnings)?;
    for warning in &warnings {
        tracing::warn!(warning = %warning, "Include not resolved");
    }
    Ok(Resolved { source, warnings })
}

fn resolve(
    source: &str,
    includes: &IncludeContext,
    depth: usize,
    warnings: &mut Vec<String>,
) -> Result<String, EngineError> {
    if depth > MAX_INCLUDE_DEPTH {
        warnings.push(format!(
            "include depth exceeded maximum of {MAX_INCLUDE_DEPTH}"
        ));
        return Ok(source.to_owned());
    }

    let mut result = String::with_capacity(source.len());
    let mut last = 0;
    for caps in INCLUDE_PATTERN.captures_iter(source) {
        let (Some(line), Some(indent), Some(path)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        let path = path.as_str();
        if path.starts_with('<') && path.ends_with('>') {
            continue;
        }

        let Some(file) = includes.resolve(path) else {
            let searched: Vec<_> = includes
                .search_dirs()
                .map(|dir| dir.join(path).display().to_string())
                .collect();
            if searched.is_empty() {
                warnings.push(format!(
                    "include file not found: '{path}' (no include directories configured)"
                ));
            } else {
                warnings.push(format!(
                    "include file not found: '{path}' (searched: {})",
                    searched.join(", ")
                ));
            }
            continue;
        };

        let content = std::fs::read_to_string(&file)?;
        let content = resolve(&content, includes, depth + 1, warnings)?;
        result.push_str(&source[last..line.start()]);
        result.push_str(&indent_content(&content, indent.as_str()));
        last = line.end();
    }
    result.push_str(&source[last..]);
    Ok(result)
}

/// Indent content with the given whitespace prefix, preserving empty lines.
fn indent_content(content: &str, indent: &str) -> String {
    let content = content.trim_end_matches('\n');
    if indent.is_empty() {
        return content.to_owned();
    }
    content
        .lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{indent}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

//! Rendering straight to files.
//!
//! The first saved page goes to the primary output path; every further page
//! goes to a path built from a pattern where `{page}` is replaced by the
//! 0-based page index:
//!
//! ```text
//! out/flow.png        page 0
//! out/flow-1.png      page 1
//! out/flow-2.png      page 2
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use umlpage_engine::DiagramEngine;

use crate::cancel::CancellationToken;
use crate::error::RenderError;
use crate::renderer::{RenderOptions, render};
use crate::request::RenderRequest;
use crate::result::RenderResult;

const PAGE_PLACEHOLDER: &str = "{page}";

/// Output file names for saved pages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputNaming {
    first: PathBuf,
    pattern: String,
}

impl OutputNaming {
    /// Explicit first path and pattern for later pages.
    ///
    /// A pattern without `{page}` gets `-{page}` appended to its file stem.
    #[must_use]
    pub fn new(first: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let pattern = if pattern.contains(PAGE_PLACEHOLDER) {
            pattern
        } else {
            with_page_suffix(Path::new(&pattern))
        };
        Self {
            first: first.into(),
            pattern,
        }
    }

    /// Derive the pattern from the primary output path
    /// (`out/flow.png` → `out/flow-{page}.png`).
    #[must_use]
    pub fn from_output(path: impl Into<PathBuf>) -> Self {
        let first = path.into();
        let pattern = with_page_suffix(&first);
        Self { first, pattern }
    }

    /// Primary output path.
    #[must_use]
    pub fn first(&self) -> &Path {
        &self.first
    }

    /// Path for a page, given how many pages were `saved` before it.
    ///
    /// The first saved page always uses the primary path; for the others the
    /// document `page` index is substituted into the pattern.
    #[must_use]
    pub fn path_for(&self, saved: usize, page: usize) -> PathBuf {
        if saved == 0 {
            self.first.clone()
        } else {
            PathBuf::from(self.pattern.replace(PAGE_PLACEHOLDER, &page.to_string()))
        }
    }
}

fn with_page_suffix(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map_or_else(String::new, |s| s.to_string_lossy().into_owned());
    let name = match path.extension() {
        Some(ext) => format!("{stem}-{PAGE_PLACEHOLDER}.{}", ext.to_string_lossy()),
        None => format!("{stem}-{PAGE_PLACEHOLDER}"),
    };
    path.with_file_name(name).to_string_lossy().into_owned()
}

/// Render `request` without a cache and write the page images to disk.
///
/// Returns the written paths in page order. A single-page request writes only
/// that page, to the primary path.
///
/// # Errors
///
/// Returns any [`render`] error, or [`RenderError::Io`] if an output
/// directory or file cannot be written. Files written before a failure are
/// left in place.
pub fn render_and_save(
    engine: &dyn DiagramEngine,
    options: &RenderOptions,
    request: &RenderRequest,
    naming: &OutputNaming,
    cancel: &CancellationToken,
) -> Result<Vec<PathBuf>, RenderError> {
    let item = render(engine, options, request, None, cancel)?;
    save_pages(item.result(), naming)
}

/// Write every encoded page of `result`, skipping pages without an image.
///
/// # Errors
///
/// Returns [`RenderError::Io`] if an output directory or file cannot be
/// written.
pub fn save_pages(
    result: &RenderResult,
    naming: &OutputNaming,
) -> Result<Vec<PathBuf>, RenderError> {
    let mut written = Vec::new();
    for (page, image) in result.images().iter().enumerate() {
        let Some(image) = image else { continue };
        let path = naming.path_for(written.len(), page);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                RenderError::io(format!("create directory {}", parent.display()), e)
            })?;
        }
        fs::write(&path, image)
            .map_err(|e| RenderError::io(format!("write {}", path.display()), e))?;
        tracing::debug!(page, path = %path.display(), "Saved page");
        written.push(path);
    }

    tracing::info!(
        pages = written.len(),
        output = %naming.first().display(),
        "Saved diagram"
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use umlpage_engine::{ImageFormat, MockEngine};

    use crate::request::PageSelection;

    #[test]
    fn test_from_output_pattern() {
        let naming = OutputNaming::from_output("out/flow.png");
        assert_eq!(naming.path_for(0, 0), PathBuf::from("out/flow.png"));
        assert_eq!(naming.path_for(1, 1), PathBuf::from("out/flow-1.png"));
        assert_eq!(naming.path_for(2, 7), PathBuf::from("out/flow-7.png"));
    }

    #[test]
    fn test_from_output_without_extension() {
        let naming = OutputNaming::from_output("flow");
        assert_eq!(naming.path_for(1, 3), PathBuf::from("flow-3"));
    }

    #[test]
    fn test_explicit_pattern() {
        let naming = OutputNaming::new("a.svg", "pages/p{page}.svg");
        assert_eq!(naming.path_for(0, 4), PathBuf::from("a.svg"));
        assert_eq!(naming.path_for(1, 4), PathBuf::from("pages/p4.svg"));

        let suffixed = OutputNaming::new("a.svg", "b.svg");
        assert_eq!(suffixed.path_for(1, 2), PathBuf::from("b-2.svg"));
    }

    #[test]
    fn test_saves_every_page() {
        let dir = TempDir::new().unwrap();
        let naming = OutputNaming::from_output(dir.path().join("nested/flow.svg"));
        let request = RenderRequest::new("A\nnewpage\nB\nnewpage Last\nC").format(ImageFormat::Svg);

        let paths = render_and_save(
            &MockEngine::new(),
            &RenderOptions::default(),
            &request,
            &naming,
            &CancellationToken::new(),
        )
        .unwrap();

        assert_eq!(
            paths,
            vec![
                dir.path().join("nested/flow.svg"),
                dir.path().join("nested/flow-1.svg"),
                dir.path().join("nested/flow-2.svg"),
            ]
        );
        assert_eq!(fs::read(&paths[2]).unwrap(), b"sequence:2:1:svg");
    }

    #[test]
    fn test_single_page_goes_to_primary_path() {
        let dir = TempDir::new().unwrap();
        let naming = OutputNaming::from_output(dir.path().join("flow.svg"));
        let request = RenderRequest::new("A\nnewpage\nB")
            .format(ImageFormat::Svg)
            .page(PageSelection::Single(1));

        let paths = render_and_save(
            &MockEngine::new(),
            &RenderOptions::default(),
            &request,
            &naming,
            &CancellationToken::new(),
        )
        .unwrap();

        assert_eq!(paths, vec![dir.path().join("flow.svg")]);
        assert_eq!(fs::read(&paths[0]).unwrap(), b"sequence:1:1:svg");
        assert!(!dir.path().join("flow-1.svg").exists());
    }

    #[test]
    fn test_save_pages_skips_missing_images() {
        let dir = TempDir::new().unwrap();
        let naming = OutputNaming::from_output(dir.path().join("flow.svg"));
        let request = RenderRequest::new("A\nnewpage\nB\nnewpage\nC")
            .format(ImageFormat::Svg)
            .page(PageSelection::Single(2));
        let item = render(
            &MockEngine::new(),
            &RenderOptions::default(),
            &request,
            None,
            &CancellationToken::new(),
        )
        .unwrap();

        let paths = save_pages(item.result(), &naming).unwrap();
        assert_eq!(paths, vec![dir.path().join("flow.svg")]);
        assert_eq!(fs::read(&paths[0]).unwrap(), b"sequence:2:1:svg");
    }

    #[test]
    fn test_cancelled_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let naming = OutputNaming::from_output(dir.path().join("flow.svg"));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = render_and_save(
            &MockEngine::new(),
            &RenderOptions::default(),
            &RenderRequest::new("A"),
            &naming,
            &cancel,
        )
        .unwrap_err();

        assert!(err.is_cancelled());
        assert!(!naming.first().exists());
    }
}

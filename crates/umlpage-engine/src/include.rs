//! Include resolution context.
//!
//! Every render builds its own [`IncludeContext`] and lends it to the engine
//! for the duration of one `parse` call. There is no process-wide "current
//! directory": once the render returns, on success, error or cancellation,
//! the context is dropped with it and nothing leaks into the next render.

use std::path::{Path, PathBuf};

/// Directories searched when a document includes another file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IncludeContext {
    base_dir: Option<PathBuf>,
    include_dirs: Vec<PathBuf>,
}

impl IncludeContext {
    /// Create a context rooted at the document's directory.
    #[must_use]
    pub fn new(base_dir: Option<PathBuf>) -> Self {
        Self {
            base_dir,
            include_dirs: Vec::new(),
        }
    }

    /// Add directories searched after the base directory.
    #[must_use]
    pub fn with_include_dirs(mut self, dirs: &[PathBuf]) -> Self {
        self.include_dirs.extend_from_slice(dirs);
        self
    }

    /// The document's own directory, if known.
    #[must_use]
    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    /// All search directories, base directory first.
    pub fn search_dirs(&self) -> impl Iterator<Item = &Path> {
        self.base_dir
            .iter()
            .chain(self.include_dirs.iter())
            .map(PathBuf::as_path)
    }

    /// Resolve an include path.
    ///
    /// Absolute paths are returned when they exist. Relative paths are tried
    /// against each search directory in order; the first existing file wins.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<PathBuf> {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            return candidate.is_file().then(|| candidate.to_path_buf());
        }
        let resolved = self
            .search_dirs()
            .map(|dir| dir.join(candidate))
            .find(|full| full.is_file());
        if resolved.is_none() {
            tracing::debug!(path, "include not found in any search directory");
        }
        resolved
    }
}

//! Cooperative cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::RenderError;

/// Shared flag asking an in-flight render to stop.
///
/// Clones share the same flag. The renderer polls it before parsing, before
/// each diagram block and before each page encode; it never interrupts the
/// engine mid-operation.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every holder of this token to stop.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Safe point: fail with [`RenderError::Cancelled`] if cancellation was requested.
    pub fn check(&self) -> Result<(), RenderError> {
        if self.is_cancelled() {
            tracing::debug!("render cancelled at safe point");
            return Err(RenderError::Cancelled);
        }
        Ok(())
    }
}

//! `umlpage watch` command implementation.
//!
//! Renders the document once, then again on every change. A change that
//! arrives while a render is running cancels it; the next render starts only
//! after the cancelled one has returned, so at most one render per document
//! is ever in flight.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use clap::Args;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use umlpage_kroki::KrokiEngine;
use umlpage_render::{CancellationToken, OutputNaming, Renderer, save_pages};

use super::{DocumentArgs, Session};
use crate::error::CliError;
use crate::output::Output;

/// Quiet period before a burst of events triggers a render.
const DEBOUNCE: Duration = Duration::from_millis(100);

/// Arguments for the watch command.
#[derive(Args)]
pub(crate) struct WatchArgs {
    #[command(flatten)]
    document: DocumentArgs,

    /// Output file for the first page (default: input with the format's extension).
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// A render running on its own thread.
struct RenderJob {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl RenderJob {
    /// Cancel the render and wait for its thread to return.
    fn stop(self) {
        self.cancel.cancel();
        if self.handle.join().is_err() {
            tracing::warn!("Render thread panicked");
        }
    }
}

impl WatchArgs {
    /// Execute the watch command. Runs until the process is interrupted.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let session = Arc::new(self.document.session()?);
        let naming = Arc::new(OutputNaming::from_output(
            self.output.unwrap_or_else(|| session.default_output()),
        ));
        let renderer = Arc::new(
            Renderer::new(session.engine.clone()).with_options(session.options.clone()),
        );

        let (tx, rx) = mpsc::channel::<Event>();
        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.send(event);
            }
        })?;
        let watch_dir = watch_dir(&session.input);
        watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;

        output.info(&format!(
            "Watching {} (Ctrl+C to stop)",
            session.input.display()
        ));

        let input = std::fs::canonicalize(&session.input)?;
        let mut current = Some(spawn_render(&session, &renderer, &naming));

        while let Ok(event) = rx.recv() {
            if !is_change_to(&event, &input) {
                continue;
            }
            // Editors emit several events per save; wait for them to settle.
            while rx.recv_timeout(DEBOUNCE).is_ok() {}

            if let Some(job) = current.take() {
                job.stop();
            }
            current = Some(spawn_render(&session, &renderer, &naming));
        }

        if let Some(job) = current.take() {
            job.stop();
        }
        Ok(())
    }
}

/// Start rendering the current file contents on a new thread.
fn spawn_render(
    session: &Arc<Session>,
    renderer: &Arc<Renderer<KrokiEngine>>,
    naming: &Arc<OutputNaming>,
) -> RenderJob {
    let cancel = CancellationToken::new();
    let session = Arc::clone(session);
    let renderer = Arc::clone(renderer);
    let naming = Arc::clone(naming);
    let token = cancel.clone();

    let handle = thread::spawn(move || {
        let output = Output::new();
        let result = session.request().and_then(|request| {
            let result = renderer.render(&session.document_id(), &request, &token)?;
            let paths = save_pages(&result, &naming)?;
            Ok((result, paths))
        });

        match result {
            Ok((result, paths)) => {
                let stats = result.stats();
                output.success(&format!(
                    "Rendered {} page(s), {} reused, {} written",
                    result.page_count(),
                    stats.reused_fragments,
                    paths.len()
                ));
            }
            Err(CliError::Render(e)) if e.is_cancelled() => {}
            Err(e) => output.warning(&format!("Render failed: {e}")),
        }
    });

    RenderJob { cancel, handle }
}

/// Directory to watch for changes to `input`.
fn watch_dir(input: &Path) -> PathBuf {
    match input.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Whether `event` creates or modifies the file at `input`.
///
/// Atomic saves show up as a create of the target path, so creates count.
fn is_change_to(event: &Event, input: &Path) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event.paths.iter().any(|path| {
            path == input || std::fs::canonicalize(path).is_ok_and(|path| path == input)
        })
}

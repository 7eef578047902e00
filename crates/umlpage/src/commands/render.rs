//! `umlpage render` command implementation.

use std::path::PathBuf;

use clap::Args;
use umlpage_render::{CancellationToken, OutputNaming, PageSelection, render_and_save};

use super::DocumentArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    #[command(flatten)]
    document: DocumentArgs,

    /// Output file for the first page (default: input with the format's extension).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pattern for later pages, `{page}` is the 0-based page index
    /// (default: `<output stem>-{page}.<ext>`).
    #[arg(long)]
    pattern: Option<String>,

    /// Render only this 0-based page.
    #[arg(short, long)]
    page: Option<usize>,
}

impl RenderArgs {
    /// Execute the render command.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let session = self.document.session()?;

        let first = self.output.unwrap_or_else(|| session.default_output());
        let naming = match self.pattern {
            Some(pattern) => OutputNaming::new(first, pattern),
            None => OutputNaming::from_output(first),
        };
        let selection = self.page.map_or(PageSelection::All, PageSelection::Single);
        let request = session.request()?.page(selection);

        output.info(&format!("Rendering {}", session.input.display()));
        let paths = render_and_save(
            &session.engine,
            &session.options,
            &request,
            &naming,
            &CancellationToken::new(),
        )?;

        for path in &paths {
            output.detail(&format!("  {}", path.display()));
        }
        output.success(&format!("Saved {} page(s)", paths.len()));
        Ok(())
    }
}

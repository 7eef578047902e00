//! `umlpage titles` command implementation.

use clap::Args;
use console::Term;
use umlpage_render::{CancellationToken, PageSelection, Titles, render};

use super::DocumentArgs;
use crate::error::CliError;

/// Arguments for the titles command.
#[derive(Args)]
pub(crate) struct TitlesArgs {
    #[command(flatten)]
    document: DocumentArgs,
}

impl TitlesArgs {
    /// Execute the titles command.
    ///
    /// Titles and the page count need every page parsed but only one encoded,
    /// so the first page is the only image requested from the server.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let session = self.document.session()?;
        let request = session.request()?.page(PageSelection::Single(0));

        let item = render(
            &session.engine,
            &session.options,
            &request,
            None,
            &CancellationToken::new(),
        )?;

        let term = Term::stdout();
        for line in title_lines(item.result().titles()) {
            term.write_line(&line)?;
        }
        Ok(())
    }
}

/// One `index<TAB>title` line per page, empty after the tab when untitled.
fn title_lines(titles: &Titles) -> Vec<String> {
    titles
        .iter()
        .enumerate()
        .map(|(page, title)| format!("{page}\t{}", title.unwrap_or_default()))
        .collect()
}

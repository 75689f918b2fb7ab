//! Error rendering at the process boundary.

use miette::Report;
use tr_core::{Error, Result};

/// Installs miette as the global report handler.
pub fn setup_error_reporting() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .map_err(|e| Error::config(format!("failed to set up error reporting: {e}")))?;
    Ok(())
}

/// Prints `error` with its code, help and related errors.
pub fn render_cli_error(error: Error) {
    eprintln!("{:?}", Report::new(error));
}

//! Preview command implementation.

use super::{load_context, CliError, OutputOptions};
use bibsave_core::{DatabaseWriter, Selection};
use bibsave_storage::MemorySink;
use std::io::{self, Write};
use std::path::Path;

/// Renders the database without touching any file.
pub fn render(input: &Path, options: &OutputOptions) -> Result<String, CliError> {
    let ctx = load_context(input)?;
    let prefs = options.preferences()?;

    let mut sink = MemorySink::new();
    let summary = DatabaseWriter::new().write_to(&ctx, Selection::all(), &prefs, &mut sink)?;
    tracing::debug!(?summary, "rendered preview");
    Ok(sink.into_string())
}

/// Runs the preview command, printing to stdout.
pub fn run(input: &Path, options: &OutputOptions) -> Result<(), CliError> {
    let text = render(input, options)?;
    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

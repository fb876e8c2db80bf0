//! Save command implementation.

use super::{load_context, CliError, OutputOptions};
use bibsave_core::{DatabaseWriter, Selection};
use std::path::Path;
use tracing::{info, warn};

/// Record selection flags for the save command.
#[derive(Debug, Clone, Copy, Default)]
pub struct Filters {
    /// Skip records flagged as search hits.
    pub skip_search_hits: bool,
    /// Skip records flagged as group hits.
    pub skip_group_hits: bool,
}

/// Runs the save command.
pub fn run(
    input: &Path,
    output: &Path,
    options: &OutputOptions,
    backup: bool,
    filters: Filters,
) -> Result<(), CliError> {
    let ctx = load_context(input)?;
    let mut prefs = options.preferences()?.make_backup(backup);
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        prefs = prefs.staging_dir(parent);
    }

    let writer = DatabaseWriter::new();
    let selection = Selection::all().excluding_hits(filters.skip_search_hits, filters.skip_group_hits);

    let mut session = writer.save_selection(&ctx, selection, &prefs)?;
    if !session.could_encode_all() {
        warn!(
            chars = %session.problem_characters(),
            encoding = %prefs.encoding,
            "some characters were replaced"
        );
    }
    let receipt = session.commit(output)?;

    info!(path = ?receipt.path, bytes = receipt.bytes_written, "saved");
    println!("Saved {} bytes to {}", receipt.bytes_written, receipt.path.display());
    println!("SHA-256: {}", receipt.digest);
    if let Some(backup) = &receipt.backup {
        println!("Backup:  {}", backup.display());
    }
    if !receipt.problem_characters.is_empty() {
        println!("Replaced characters: {}", receipt.problem_characters);
    }
    Ok(())
}

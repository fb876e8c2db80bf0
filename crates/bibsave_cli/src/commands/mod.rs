//! CLI command implementations.

pub mod order;
pub mod preview;
pub mod save;

use bibsave_core::{DatabaseContext, SaveError, SavePreferences, SaveType, SortCriterion};
use bibsave_storage::{Encoding, StorageError};
use clap::Args;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors reported by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// The database snapshot could not be read.
    #[error("cannot read {path}: {source}")]
    Read {
        /// Snapshot path.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },

    /// The database snapshot is not valid JSON.
    #[error("invalid database snapshot {path}: {source}")]
    Snapshot {
        /// Snapshot path.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// A command-line value was rejected.
    #[error("invalid argument: {0}")]
    Argument(String),

    /// The save failed.
    #[error(transparent)]
    Save(#[from] SaveError),

    /// Output could not be produced.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Writing to the terminal failed.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// JSON output failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Loads a JSON database snapshot.
pub fn load_context(path: &Path) -> Result<DatabaseContext, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let ctx: DatabaseContext = serde_json::from_str(&text).map_err(|source| CliError::Snapshot {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        path = ?path,
        records = ctx.database.records().len(),
        strings = ctx.database.strings().len(),
        "loaded database snapshot"
    );
    Ok(ctx)
}

/// Options shared by commands that produce output.
#[derive(Debug, Clone, Args)]
pub struct OutputOptions {
    /// Output encoding (UTF-8, US-ASCII, ISO-8859-1)
    #[arg(short, long, default_value = "UTF-8")]
    pub encoding: String,

    /// Omit the encoding header, metadata and type definitions
    #[arg(long)]
    pub plain: bool,

    /// Treat the write as an export rather than a database save
    #[arg(long)]
    pub export: bool,

    /// Keep insertion order for exports
    #[arg(long)]
    pub original_order: bool,

    /// Sort criterion as field[:asc|:desc]; up to three
    #[arg(long = "sort", value_name = "FIELD[:DIR]")]
    pub sort: Vec<String>,

    /// Reformat records and strings even if unchanged
    #[arg(long)]
    pub reformat: bool,
}

impl OutputOptions {
    /// Maps the flags onto save preferences.
    pub fn preferences(&self) -> Result<SavePreferences, CliError> {
        let encoding: Encoding = self
            .encoding
            .parse()
            .map_err(|e: StorageError| CliError::Argument(e.to_string()))?;

        let mut prefs = SavePreferences::new()
            .encoding(encoding)
            .is_save_operation(!self.export)
            .export_in_original_order(self.original_order)
            .reformat_unchanged(self.reformat);
        if self.plain {
            prefs = prefs.save_type(SaveType::Plain);
        }

        if !self.sort.is_empty() {
            prefs = prefs.sort_criteria(parse_criteria(&self.sort)?);
        }
        Ok(prefs)
    }
}

fn parse_criteria(values: &[String]) -> Result<[SortCriterion; 3], CliError> {
    if values.len() > 3 {
        return Err(CliError::Argument(format!(
            "at most 3 sort criteria allowed, got {}",
            values.len()
        )));
    }
    let mut criteria: [SortCriterion; 3] = Default::default();
    for (slot, value) in criteria.iter_mut().zip(values) {
        *slot = value.parse().map_err(CliError::Argument)?;
    }
    Ok(criteria)
}

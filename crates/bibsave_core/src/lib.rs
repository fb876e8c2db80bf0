//! # bibsave Core
//!
//! Deterministic BibTeX writer for bibsave.
//!
//! This crate provides:
//! - The database model read by the writer (records, strings, metadata, groups, types)
//! - The field formatter used for every value
//! - The ordering engine (comparator stacks chosen from save configuration)
//! - String definitions written in dependency order
//! - Metadata and group tree comment blocks
//! - Custom type definition collection
//! - Pre-save field transformations
//! - [`DatabaseWriter`], tying it all to an atomic [`bibsave_storage::SaveSession`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use bibsave_core::{Database, DatabaseContext, DatabaseWriter, SavePreferences};
//! use std::path::Path;
//!
//! let ctx = DatabaseContext::new(Database::new());
//! let receipt = DatabaseWriter::new()
//!     .save_to(&ctx, &SavePreferences::default(), Path::new("refs.bib"))
//!     .unwrap();
//! println!("{} bytes, sha256 {}", receipt.bytes_written, receipt.digest);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod format;
pub mod model;
pub mod order;
mod save_actions;
mod writer;

pub use config::{SaveOrderConfig, SavePreferences, SaveType, SortCriterion};
pub use error::{FormatError, SaveError, SaveResult, STRING_HASH_REMEDIATION};
pub use format::{
    split_concatenation, string_references, FieldFormatter, FormatContext, LatexFieldFormatter,
    Segment,
};
pub use model::{
    Database, DatabaseContext, DatabaseMode, EntryTypeSpec, Group, GroupContext, GroupTreeNode,
    MacroCategory, MetaData, Record, RecordId, StringMacro, TypeDefinition, TypeRegistry,
};
pub use order::{sorted_records, OrderStrategy};
pub use save_actions::{BuiltinTransform, FieldTransform, SaveActions, TransformRule};
pub use writer::{DatabaseWriter, Selection, WriteSummary};

//! # bibsave Storage
//!
//! Output sinks and atomic save sessions for bibsave.
//!
//! This crate is the lowest layer of a save. Sinks are **opaque text
//! streams**: they encode and store what they are given and never interpret
//! the bibliography format.
//!
//! ## Design Principles
//!
//! - Sinks are append-only (write, flush)
//! - Every character is checked against the target encoding
//! - The destination file is replaced atomically or not at all
//!
//! ## Available Sinks
//!
//! - [`MemorySink`] - For testing and previews
//! - [`VerifyingWriter`] - Encoding-checked file output, owned by a [`SaveSession`]
//!
//! ## Example
//!
//! ```rust
//! use bibsave_storage::{MemorySink, TextSink};
//!
//! let mut sink = MemorySink::new();
//! sink.write_str("% Encoding: UTF-8\n").unwrap();
//! assert!(sink.contents().starts_with('%'));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod encoding;
mod error;
mod file;
mod memory;
mod session;
mod sink;

pub use encoding::{Encoding, REPLACEMENT};
pub use error::{StorageError, StorageResult};
pub use file::{hex_encode, VerifyingWriter};
pub use memory::MemorySink;
pub use session::{CommitReceipt, SaveSession, SessionState, BACKUP_SUFFIX, LOCK_SUFFIX};
pub use sink::TextSink;

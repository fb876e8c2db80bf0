//! Encoding-checked file writer.

use crate::encoding::Encoding;
use crate::error::StorageResult;
use crate::sink::TextSink;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};

/// A file writer that verifies every character against the target encoding.
///
/// Characters the encoding cannot represent are written as `?` and remembered,
/// so the caller can warn before committing a lossy file. The writer also
/// keeps a running SHA-256 digest and byte count of the encoded output.
///
/// # Durability
///
/// - `flush()` pushes buffered bytes to the OS
/// - `sync()` additionally calls `File::sync_all()`
#[derive(Debug)]
pub struct VerifyingWriter {
    out: BufWriter<File>,
    encoding: Encoding,
    problems: BTreeSet<char>,
    hasher: Sha256,
    bytes_written: u64,
    scratch: Vec<u8>,
}

impl VerifyingWriter {
    /// Wraps `file`, encoding all text with `encoding`.
    #[must_use]
    pub fn new(file: File, encoding: Encoding) -> Self {
        Self {
            out: BufWriter::new(file),
            encoding,
            problems: BTreeSet::new(),
            hasher: Sha256::new(),
            bytes_written: 0,
            scratch: Vec::new(),
        }
    }

    /// Returns the encoding used by this writer.
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Returns true if every character written so far was representable.
    #[must_use]
    pub fn could_encode_all(&self) -> bool {
        self.problems.is_empty()
    }

    /// Returns the distinct unrepresentable characters, in code point order.
    #[must_use]
    pub fn problem_characters(&self) -> String {
        self.problems.iter().collect()
    }

    /// Returns the number of encoded bytes written.
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Returns the SHA-256 digest of the encoded bytes written so far.
    #[must_use]
    pub fn digest(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&self.hasher.clone().finalize());
        out
    }

    /// Flushes and syncs the file to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush or sync fails.
    pub fn sync(&mut self) -> StorageResult<()> {
        self.out.flush()?;
        self.out.get_ref().sync_all()?;
        Ok(())
    }
}

impl TextSink for VerifyingWriter {
    fn write_str(&mut self, text: &str) -> StorageResult<()> {
        if text.is_empty() {
            return Ok(());
        }

        self.scratch.clear();
        let problems = &mut self.problems;
        self.encoding.encode_into(text, &mut self.scratch, |c| {
            problems.insert(c);
        });

        self.out.write_all(&self.scratch)?;
        self.hasher.update(&self.scratch);
        self.bytes_written += self.scratch.len() as u64;
        Ok(())
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Encodes bytes as a lowercase hexadecimal string.
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

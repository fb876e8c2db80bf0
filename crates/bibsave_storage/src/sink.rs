//! Text sink trait definition.

use crate::error::StorageResult;

/// A destination for serialized text.
///
/// Sinks are **append-only text streams**. They know nothing about the
/// bibliography format; writers own all layout decisions and push finished
/// fragments through [`TextSink::write_str`].
///
/// # Invariants
///
/// - Fragments appear in the output in the order they were written
/// - A failed write leaves the sink unusable for the current save
///
/// # Implementors
///
/// - [`super::MemorySink`] - For tests and previews
/// - [`super::VerifyingWriter`] - Encoding-checked file output
pub trait TextSink {
    /// Appends `text` to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying output cannot be written.
    fn write_str(&mut self, text: &str) -> StorageResult<()>;

    /// Appends a single character.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying output cannot be written.
    fn write_char(&mut self, c: char) -> StorageResult<()> {
        let mut buf = [0u8; 4];
        self.write_str(c.encode_utf8(&mut buf))
    }

    /// Flushes buffered output.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    fn flush(&mut self) -> StorageResult<()>;
}

impl<T: TextSink + ?Sized> TextSink for &mut T {
    fn write_str(&mut self, text: &str) -> StorageResult<()> {
        (**self).write_str(text)
    }

    fn flush(&mut self) -> StorageResult<()> {
        (**self).flush()
    }
}

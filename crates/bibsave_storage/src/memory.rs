//! In-memory text sink for tests and previews.

use crate::error::StorageResult;
use crate::sink::TextSink;
use parking_lot::RwLock;
use std::io;

/// An in-memory text sink.
///
/// This sink keeps everything in a `String` and is suitable for:
/// - Unit tests of individual emitters
/// - Previewing output without touching the file system
///
/// # Example
///
/// ```rust
/// use bibsave_storage::{MemorySink, TextSink};
///
/// let mut sink = MemorySink::new();
/// sink.write_str("@String { a = {b} }").unwrap();
/// assert_eq!(sink.contents(), "@String { a = {b} }");
/// ```
#[derive(Debug, Default)]
pub struct MemorySink {
    data: RwLock<String>,
    fail_after: Option<usize>,
}

impl MemorySink {
    /// Creates a new empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink that fails once more than `limit` bytes were written.
    ///
    /// Useful for exercising abort paths.
    #[must_use]
    pub fn failing_after(limit: usize) -> Self {
        Self {
            data: RwLock::new(String::new()),
            fail_after: Some(limit),
        }
    }

    /// Returns a copy of everything written so far.
    #[must_use]
    pub fn contents(&self) -> String {
        self.data.read().clone()
    }

    /// Consumes the sink and returns its contents.
    #[must_use]
    pub fn into_string(self) -> String {
        self.data.into_inner()
    }

    /// Clears all written text.
    pub fn clear(&mut self) {
        self.data.write().clear();
    }
}

impl TextSink for MemorySink {
    fn write_str(&mut self, text: &str) -> StorageResult<()> {
        let mut data = self.data.write();
        if let Some(limit) = self.fail_after {
            if data.len() + text.len() > limit {
                return Err(io::Error::new(io::ErrorKind::WriteZero, "sink capacity exceeded").into());
            }
        }
        data.push_str(text);
        Ok(())
    }

    fn flush(&mut self) -> StorageResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;

    #[test]
    fn memory_write_and_read() {
        let mut sink = MemorySink::new();
        sink.write_str("hello").unwrap();
        sink.write_char(' ').unwrap();
        sink.write_str("world").unwrap();
        assert_eq!(sink.contents(), "hello world");
    }

    #[test]
    fn memory_clear() {
        let mut sink = MemorySink::new();
        sink.write_str("data").unwrap();
        sink.clear();
        assert!(sink.contents().is_empty());
    }

    #[test]
    fn memory_failing_after_limit() {
        let mut sink = MemorySink::failing_after(4);
        sink.write_str("abcd").unwrap();
        let result = sink.write_str("e");
        assert!(matches!(result, Err(StorageError::Io(_))));
        assert_eq!(sink.into_string(), "abcd");
    }
}

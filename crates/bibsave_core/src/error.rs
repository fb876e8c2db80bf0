//! Error types for bibsave core.

use crate::model::RecordId;
use std::io;
use thiserror::Error;

/// Result type for save operations.
pub type SaveResult<T> = Result<T, SaveError>;

/// Guidance shown when a string definition cannot be formatted.
pub const STRING_HASH_REMEDIATION: &str = "The # character is not allowed in BibTeX strings \
unless escaped as in '\\#'. Before saving, please edit any strings containing the # character.";

/// Errors that can occur while writing a database.
#[derive(Debug, Error)]
pub enum SaveError {
    /// Sink or session error.
    #[error("storage error: {0}")]
    Storage(#[from] bibsave_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A value could not be safely escaped.
    #[error("cannot format {subject}: {message}")]
    Format {
        /// What was being formatted (field or string name).
        subject: String,
        /// Description of the problem.
        message: String,
    },

    /// A failure while a specific record was being written.
    #[error("could not write record {} ({id}): {source}", .key.as_deref().unwrap_or("<no key>"))]
    Record {
        /// The record being processed.
        id: RecordId,
        /// Its citation key, if any.
        key: Option<String>,
        /// The underlying failure.
        source: Box<SaveError>,
    },
}

/// Errors raised by a [`crate::FieldFormatter`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// An odd number of unescaped `#` characters.
    #[error("unbalanced '#' at byte {position}")]
    UnbalancedHash {
        /// Offset of the unmatched `#`.
        position: usize,
    },

    /// A `##` pair with no macro name between.
    #[error("empty string reference at byte {position}")]
    EmptyReference {
        /// Offset of the opening `#`.
        position: usize,
    },

    /// Braces do not nest properly.
    #[error("unbalanced braces at byte {position}")]
    UnbalancedBraces {
        /// Offset where the imbalance was detected.
        position: usize,
    },

    /// A control character that cannot be written.
    #[error("forbidden character U+{:04X}", code_point(.0))]
    ForbiddenCharacter(char),
}

fn code_point(c: &char) -> u32 {
    u32::from(*c)
}

impl SaveError {
    /// Creates a format error.
    pub fn format(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Format {
            subject: subject.into(),
            message: message.into(),
        }
    }

    /// Creates a format error for a string definition, with remediation guidance.
    pub fn string_format(name: &str, cause: &FormatError) -> Self {
        Self::Format {
            subject: format!("string '{name}'"),
            message: format!("{cause}\n{STRING_HASH_REMEDIATION}"),
        }
    }

    /// Attaches the record being processed to `source`.
    pub fn record(id: RecordId, key: Option<&str>, source: SaveError) -> Self {
        Self::Record {
            id,
            key: key.map(str::to_string),
            source: Box::new(source),
        }
    }

    /// Returns the record implicated in this failure, if any.
    #[must_use]
    pub fn record_id(&self) -> Option<RecordId> {
        match self {
            Self::Record { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// Returns the citation key of the implicated record, if any.
    #[must_use]
    pub fn record_key(&self) -> Option<&str> {
        match self {
            Self::Record { key, .. } => key.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_error_names_key() {
        let err = SaveError::record(
            RecordId::new(7),
            Some("knuth84"),
            SaveError::format("field 'title'", "unbalanced braces at byte 3"),
        );
        assert_eq!(err.record_id(), Some(RecordId::new(7)));
        assert_eq!(err.record_key(), Some("knuth84"));
        let text = err.to_string();
        assert!(text.contains("knuth84"));
        assert!(text.contains("unbalanced braces"));
    }

    #[test]
    fn string_format_includes_remediation() {
        let err = SaveError::string_format("acm", &FormatError::UnbalancedHash { position: 2 });
        assert!(err.to_string().contains("escaped as in '\\#'"));
        assert_eq!(err.record_id(), None);
    }

    #[test]
    fn forbidden_character_display() {
        assert_eq!(
            FormatError::ForbiddenCharacter('\u{7}').to_string(),
            "forbidden character U+0007"
        );
    }
}

//! Field value formatting.
//!
//! A value is a concatenation of literal text and `#name#` string
//! references. The formatter wraps literals in braces and writes references
//! bare, joined by ` # `:
//!
//! ```text
//! "#jan# 1984"   ──▶  jan # { 1984}
//! "Knuth"        ──▶  {Knuth}
//! ""             ──▶  {}
//! ```

use crate::error::FormatError;

/// Where a value being formatted lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatContext<'a> {
    /// A record field with the given (lowercase) name.
    Field(&'a str),
    /// The content of an `@String` definition.
    StringMacro,
}

/// Pure value to text transform used for every field and string.
pub trait FieldFormatter {
    /// Formats `value` for output.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be written safely.
    fn format(&self, value: &str, context: FormatContext<'_>) -> Result<String, FormatError>;
}

/// A piece of a concatenated value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text written inside braces.
    Literal(&'a str),
    /// Name of a string definition written bare.
    Reference(&'a str),
}

/// Splits `value` on unescaped `#` into literals and references.
///
/// Empty literals are dropped.
///
/// # Errors
///
/// Returns an error on an odd number of unescaped `#` or an empty `##` pair.
pub fn split_concatenation(value: &str) -> Result<Vec<Segment<'_>>, FormatError> {
    let marks: Vec<usize> = unescaped_hashes(value).collect();
    if marks.len() % 2 == 1 {
        return Err(FormatError::UnbalancedHash {
            position: marks[marks.len() - 1],
        });
    }

    let mut segments = Vec::new();
    let mut start = 0;
    for pair in marks.chunks(2) {
        let (open, close) = (pair[0], pair[1]);
        if open > start {
            segments.push(Segment::Literal(&value[start..open]));
        }
        if close == open + 1 {
            return Err(FormatError::EmptyReference { position: open });
        }
        segments.push(Segment::Reference(&value[open + 1..close]));
        start = close + 1;
    }
    if start < value.len() {
        segments.push(Segment::Literal(&value[start..]));
    }
    Ok(segments)
}

fn unescaped_hashes(value: &str) -> impl Iterator<Item = usize> + '_ {
    let bytes = value.as_bytes();
    bytes
        .iter()
        .enumerate()
        .filter(move |&(i, &b)| b == b'#' && (i == 0 || bytes[i - 1] != b'\\'))
        .map(|(i, _)| i)
}

/// Returns the names of `#name#` references in `content`.
///
/// Markers pair up the way [`split_concatenation`] pairs them, so every name
/// the formatter writes bare is reported. Scanning is tolerant: empty pairs
/// and a trailing unpaired `#` are skipped rather than reported.
#[must_use]
pub fn string_references(content: &str) -> Vec<&str> {
    let marks: Vec<usize> = unescaped_hashes(content).collect();
    marks
        .chunks_exact(2)
        .filter(|pair| pair[1] > pair[0] + 1)
        .map(|pair| &content[pair[0] + 1..pair[1]])
        .collect()
}

fn check_braces(text: &str, offset: usize) -> Result<(), FormatError> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate() {
        let escaped = i > 0 && bytes[i - 1] == b'\\';
        match b {
            b'{' if !escaped => depth += 1,
            b'}' if !escaped => {
                depth = depth.checked_sub(1).ok_or(FormatError::UnbalancedBraces {
                    position: offset + i,
                })?;
            }
            _ => {}
        }
    }
    if depth == 0 {
        Ok(())
    } else {
        Err(FormatError::UnbalancedBraces {
            position: offset + text.len(),
        })
    }
}

fn check_characters(value: &str) -> Result<(), FormatError> {
    match value
        .chars()
        .find(|&c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
    {
        Some(c) => Err(FormatError::ForbiddenCharacter(c)),
        None => Ok(()),
    }
}

/// The default BibTeX/LaTeX formatter.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatexFieldFormatter;

impl LatexFieldFormatter {
    /// Creates the formatter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl FieldFormatter for LatexFieldFormatter {
    fn format(&self, value: &str, context: FormatContext<'_>) -> Result<String, FormatError> {
        check_characters(value)?;

        if context == FormatContext::Field("year")
            && !value.is_empty()
            && value.bytes().all(|b| b.is_ascii_digit())
        {
            return Ok(value.to_string());
        }

        let segments = split_concatenation(value)?;
        if segments.is_empty() {
            return Ok("{}".to_string());
        }

        let mut parts = Vec::with_capacity(segments.len());
        for segment in segments {
            match segment {
                Segment::Literal(text) => {
                    let offset = text.as_ptr() as usize - value.as_ptr() as usize;
                    check_braces(text, offset)?;
                    parts.push(format!("{{{text}}}"));
                }
                Segment::Reference(name) => parts.push(name.to_string()),
            }
        }
        Ok(parts.join(" # "))
    }
}

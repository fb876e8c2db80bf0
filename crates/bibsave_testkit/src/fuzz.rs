//! Fuzz targets for bibsave.
//!
//! Each target takes raw bytes and must never panic. They can be driven by
//! cargo-fuzz or by the seeded loops in this module's tests.

use bibsave_core::{
    split_concatenation, string_references, DatabaseContext, DatabaseWriter, FieldFormatter,
    FormatContext, LatexFieldFormatter, SaveOrderConfig, SavePreferences, Segment, Selection,
};
use bibsave_storage::MemorySink;

/// Fuzz target for value formatting.
///
/// Tests that arbitrary text either:
/// - Formats to a non-empty value, or
/// - Returns a proper error (no panics)
pub fn fuzz_format_value(data: &[u8]) {
    let value = String::from_utf8_lossy(data);
    let formatter = LatexFieldFormatter;
    for context in [
        FormatContext::Field("title"),
        FormatContext::Field("year"),
        FormatContext::StringMacro,
    ] {
        if let Ok(formatted) = formatter.format(&value, context) {
            assert!(!formatted.is_empty(), "formatted value must not be empty");
        }
    }
}

/// Fuzz target for splitting `#` concatenations.
///
/// A successful split never yields an empty reference, literals and
/// references together cover every byte except the `#` marks, and the
/// dependency scan finds exactly the references the split produced.
pub fn fuzz_split_concatenation(data: &[u8]) {
    let value = String::from_utf8_lossy(data);
    let Ok(segments) = split_concatenation(&value) else {
        return;
    };
    let mut covered = 0;
    let mut references = Vec::new();
    for segment in &segments {
        match segment {
            Segment::Literal(text) => covered += text.len(),
            Segment::Reference(name) => {
                assert!(!name.is_empty(), "empty reference");
                covered += name.len() + 2;
                references.push(*name);
            }
        }
    }
    assert_eq!(covered, value.len(), "segments do not cover the value");
    assert_eq!(string_references(&value), references, "scan disagrees with split");
}

/// Fuzz target for stored save order values.
///
/// Input is split on `;` into metadata values. Anything that parses must
/// survive a serialize/parse cycle unchanged.
pub fn fuzz_save_order(data: &[u8]) {
    let text = String::from_utf8_lossy(data);
    let values: Vec<String> = text.split(';').map(str::to_string).collect();
    if let Ok(config) = SaveOrderConfig::parse(&values) {
        let reparsed = SaveOrderConfig::parse(&config.to_values());
        assert_eq!(reparsed.as_ref(), Ok(&config), "save order did not survive a cycle");
    }
}

/// Fuzz target for whole database snapshots.
///
/// Bytes that decode as a JSON snapshot are written to memory twice; the
/// writer may reject the database but must not panic, and two writes of the
/// same database must agree.
pub fn fuzz_snapshot_write(data: &[u8]) {
    let Ok(ctx) = serde_json::from_slice::<DatabaseContext>(data) else {
        return;
    };
    let writer = DatabaseWriter::new();
    let prefs = SavePreferences::default();

    let mut first = MemorySink::new();
    let mut second = MemorySink::new();
    let a = writer.write_to(&ctx, Selection::all(), &prefs, &mut first);
    let b = writer.write_to(&ctx, Selection::all(), &prefs, &mut second);
    assert_eq!(a.is_ok(), b.is_ok());
    if a.is_ok() {
        assert_eq!(first.into_string(), second.into_string(), "non-deterministic output");
    }
}

//! In-memory database snapshot handed to the writer.

use crate::model::entry_types::{DatabaseMode, TypeRegistry};
use crate::model::metadata::MetaData;
use crate::model::record::{Record, RecordId};
use crate::model::string_macro::StringMacro;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Records, string definitions, preamble and epilog.
///
/// Records keep insertion order; string names are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    #[serde(default)]
    records: Vec<Record>,
    #[serde(default)]
    strings: BTreeMap<String, StringMacro>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    preamble: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    epilog: Option<String>,
}

impl Database {
    /// Creates an empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the ID the next created record should use.
    #[must_use]
    pub fn next_id(&self) -> RecordId {
        self.records
            .iter()
            .map(Record::id)
            .max()
            .map_or(RecordId::new(1), RecordId::next)
    }

    /// Creates a record with a fresh ID and returns it for editing.
    pub fn create_record(&mut self, entry_type: &str) -> &mut Record {
        let id = self.next_id();
        let index = self.records.len();
        self.records.push(Record::new(id, entry_type));
        &mut self.records[index]
    }

    /// Appends an existing record.
    pub fn insert_record(&mut self, record: Record) {
        self.records.push(record);
    }

    /// Returns all records in insertion order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Returns mutable access to the records.
    pub fn records_mut(&mut self) -> &mut [Record] {
        &mut self.records
    }

    /// Looks up a record by ID.
    #[must_use]
    pub fn record(&self, id: RecordId) -> Option<&Record> {
        self.records.iter().find(|r| r.id() == id)
    }

    /// Looks up the first record with citation key `key`.
    #[must_use]
    pub fn record_by_key(&self, key: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.key() == Some(key))
    }

    /// Adds or replaces a string definition, returning the replaced one.
    pub fn insert_string(&mut self, string: StringMacro) -> Option<StringMacro> {
        self.strings.insert(string.name().to_string(), string)
    }

    /// Returns all string definitions keyed by name.
    #[must_use]
    pub fn strings(&self) -> &BTreeMap<String, StringMacro> {
        &self.strings
    }

    /// Returns a string definition by name.
    #[must_use]
    pub fn string(&self, name: &str) -> Option<&StringMacro> {
        self.strings.get(name)
    }

    /// Returns the preamble.
    #[must_use]
    pub fn preamble(&self) -> Option<&str> {
        self.preamble.as_deref()
    }

    /// Sets the preamble.
    pub fn set_preamble(&mut self, preamble: Option<String>) {
        self.preamble = preamble;
    }

    /// Returns the text after the last entry.
    #[must_use]
    pub fn epilog(&self) -> Option<&str> {
        self.epilog.as_deref()
    }

    /// Sets the epilog.
    pub fn set_epilog(&mut self, epilog: Option<String>) {
        self.epilog = epilog;
    }
}

/// A database together with its metadata, mode and custom types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseContext {
    /// The records and strings.
    #[serde(default)]
    pub database: Database,
    /// Free-form metadata and groups.
    #[serde(default)]
    pub metadata: MetaData,
    /// Schema flavour.
    #[serde(default)]
    pub mode: DatabaseMode,
    /// Custom entry types.
    #[serde(default)]
    pub types: TypeRegistry,
}

impl DatabaseContext {
    /// Wraps a database with empty metadata in BibTeX mode.
    #[must_use]
    pub fn new(database: Database) -> Self {
        Self {
            database,
            ..Self::default()
        }
    }

    /// Sets the schema mode.
    #[must_use]
    pub fn with_mode(mut self, mode: DatabaseMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: MetaData) -> Self {
        self.metadata = metadata;
        self
    }

    /// Sets the custom type registry.
    #[must_use]
    pub fn with_types(mut self, types: TypeRegistry) -> Self {
        self.types = types;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_record_allocates_increasing_ids() {
        let mut db = Database::new();
        let a = db.create_record("article").id();
        let b = db.create_record("book").id();
        assert!(a < b);
        assert_eq!(db.records().len(), 2);
        assert_eq!(db.record(b).unwrap().entry_type(), "book");
    }

    #[test]
    fn string_names_are_unique() {
        let mut db = Database::new();
        assert!(db.insert_string(StringMacro::new("acm", "ACM")).is_none());
        let replaced = db.insert_string(StringMacro::new("acm", "ACM Press")).unwrap();
        assert_eq!(replaced.content(), "ACM");
        assert_eq!(db.strings().len(), 1);
    }

    #[test]
    fn record_by_key() {
        let mut db = Database::new();
        db.create_record("book").set_field("title", "TAOCP");
        db.insert_record(Record::new(RecordId::new(10), "article").with_key("k1"));
        assert_eq!(db.record_by_key("k1").unwrap().id(), RecordId::new(10));
        assert_eq!(db.next_id(), RecordId::new(11));
    }

    #[test]
    fn context_json_round_trip() {
        let mut db = Database::new();
        db.insert_record(Record::new(RecordId::new(1), "misc").with_key("m"));
        db.set_preamble(Some("\\newcommand{\\x}{y}".into()));
        let ctx = DatabaseContext::new(db).with_mode(DatabaseMode::BibLatex);

        let json = serde_json::to_string(&ctx).unwrap();
        let back: DatabaseContext = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ctx);
    }
}

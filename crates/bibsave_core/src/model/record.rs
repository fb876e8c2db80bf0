//! Bibliographic records.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Pseudo-field addressing a record's citation key.
pub const KEY_FIELD: &str = "bibtexkey";
/// Pseudo-field addressing a record's type tag.
pub const TYPE_FIELD: &str = "entrytype";
/// Field naming the record another record extends.
pub const CROSSREF_FIELD: &str = "crossref";

/// Identifier for a record.
///
/// Record IDs are allocated in creation order, so comparing two IDs
/// compares when the records were created. They are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl RecordId {
    /// Creates a record ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the next ID in allocation order.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "record:{}", self.0)
    }
}

/// A single bibliography entry.
///
/// Field names are stored lowercase. The citation key is kept apart from
/// the field map but can be read through [`Record::field`] with
/// [`KEY_FIELD`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    id: RecordId,
    #[serde(rename = "type")]
    entry_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    #[serde(default)]
    fields: BTreeMap<String, String>,
    #[serde(default)]
    changed: bool,
    #[serde(default)]
    search_hit: bool,
    #[serde(default)]
    group_hit: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parsed_serialization: Option<String>,
}

impl Record {
    /// Creates a changed record with no fields.
    pub fn new(id: RecordId, entry_type: impl Into<String>) -> Self {
        Self {
            id,
            entry_type: entry_type.into().to_ascii_lowercase(),
            key: None,
            fields: BTreeMap::new(),
            changed: true,
            search_hit: false,
            group_hit: false,
            parsed_serialization: None,
        }
    }

    /// Sets the citation key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets a field.
    #[must_use]
    pub fn with_field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_field(name, value);
        self
    }

    /// Marks the record as loaded from `text` and unchanged since.
    #[must_use]
    pub fn with_parsed_serialization(mut self, text: impl Into<String>) -> Self {
        self.parsed_serialization = Some(text.into());
        self.changed = false;
        self
    }

    /// Returns the record ID.
    #[must_use]
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Returns the lowercase type tag.
    #[must_use]
    pub fn entry_type(&self) -> &str {
        &self.entry_type
    }

    /// Returns the citation key.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Returns a field value, including the [`KEY_FIELD`] and [`TYPE_FIELD`]
    /// pseudo-fields.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            KEY_FIELD => self.key(),
            TYPE_FIELD => Some(&self.entry_type),
            _ => self.fields.get(name).map(String::as_str),
        }
    }

    /// Returns all stored fields in name order.
    #[must_use]
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// Sets a field and marks the record changed.
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) {
        self.fields.insert(name.to_ascii_lowercase(), value.into());
        self.changed = true;
    }

    /// Returns the cross-referenced citation key, if any.
    #[must_use]
    pub fn crossref(&self) -> Option<&str> {
        self.fields
            .get(CROSSREF_FIELD)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    /// Returns true if the record changed since it was loaded.
    #[must_use]
    pub fn has_changed(&self) -> bool {
        self.changed
    }

    /// Sets the changed flag.
    pub fn set_changed(&mut self, changed: bool) {
        self.changed = changed;
    }

    /// Returns the text this record was loaded from.
    #[must_use]
    pub fn parsed_serialization(&self) -> Option<&str> {
        self.parsed_serialization.as_deref()
    }

    /// Returns true if the record matches the current search.
    #[must_use]
    pub fn is_search_hit(&self) -> bool {
        self.search_hit
    }

    /// Returns true if the record matches the current group selection.
    #[must_use]
    pub fn is_group_hit(&self) -> bool {
        self.group_hit
    }

    /// Sets the transient search-hit flag.
    pub fn set_search_hit(&mut self, hit: bool) {
        self.search_hit = hit;
    }

    /// Sets the transient group-hit flag.
    pub fn set_group_hit(&mut self, hit: bool) {
        self.group_hit = hit;
    }
}

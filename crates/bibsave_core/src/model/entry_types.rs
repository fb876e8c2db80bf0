//! Entry type definitions.
//!
//! A type tag resolves once to a [`TypeDefinition`]: either a standard type
//! of the active [`DatabaseMode`] (never written to the file) or a custom
//! type that must be defined in every file using it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Schema flavour of a database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseMode {
    /// Classic BibTeX types.
    #[default]
    BibTex,
    /// BibLaTeX types.
    BibLatex,
}

struct StandardType {
    name: &'static str,
    required: &'static [&'static str],
    optional: &'static [&'static str],
}

const fn std_type(
    name: &'static str,
    required: &'static [&'static str],
    optional: &'static [&'static str],
) -> StandardType {
    StandardType {
        name,
        required,
        optional,
    }
}

const BIBTEX_TYPES: &[StandardType] = &[
    std_type("article", &["author", "title", "journal", "year"], &["volume", "number", "pages", "month", "note"]),
    std_type("book", &["title", "publisher", "year", "author", "editor"], &["volume", "number", "series", "address", "edition", "month", "note"]),
    std_type("booklet", &["title"], &["author", "howpublished", "address", "month", "year", "note"]),
    std_type("conference", &["author", "title", "booktitle", "year"], &["editor", "volume", "number", "series", "pages", "address", "month", "organization", "publisher", "note"]),
    std_type("inbook", &["chapter", "pages", "title", "publisher", "year", "author", "editor"], &["volume", "number", "series", "type", "address", "edition", "month", "note"]),
    std_type("incollection", &["author", "title", "booktitle", "publisher", "year"], &["editor", "volume", "number", "series", "type", "chapter", "pages", "address", "edition", "month", "note"]),
    std_type("inproceedings", &["author", "title", "booktitle", "year"], &["editor", "volume", "number", "series", "pages", "address", "month", "organization", "publisher", "note"]),
    std_type("manual", &["title"], &["author", "organization", "address", "edition", "month", "year", "note"]),
    std_type("mastersthesis", &["author", "title", "school", "year"], &["type", "address", "month", "note"]),
    std_type("misc", &[], &["author", "title", "howpublished", "month", "year", "note"]),
    std_type("phdthesis", &["author", "title", "school", "year"], &["type", "address", "month", "note"]),
    std_type("proceedings", &["title", "year"], &["editor", "volume", "number", "series", "address", "publisher", "note", "month", "organization"]),
    std_type("techreport", &["author", "title", "institution", "year"], &["type", "number", "address", "month", "note"]),
    std_type("unpublished", &["author", "title", "note"], &["month", "year"]),
];

const BIBLATEX_TYPES: &[StandardType] = &[
    std_type("article", &["author", "title", "journaltitle", "date"], &["volume", "number", "pages", "doi", "note"]),
    std_type("book", &["author", "title", "date"], &["editor", "volume", "series", "publisher", "location", "isbn", "note"]),
    std_type("mvbook", &["author", "title", "date"], &["editor", "volumes", "publisher", "location", "note"]),
    std_type("inbook", &["author", "title", "booktitle", "date"], &["editor", "chapter", "pages", "publisher", "location", "note"]),
    std_type("bookinbook", &["author", "title", "booktitle", "date"], &["editor", "chapter", "pages", "publisher", "location", "note"]),
    std_type("suppbook", &["author", "title", "booktitle", "date"], &["editor", "pages", "publisher", "location", "note"]),
    std_type("booklet", &["title", "date"], &["author", "editor", "howpublished", "location", "note"]),
    std_type("collection", &["editor", "title", "date"], &["volume", "series", "publisher", "location", "note"]),
    std_type("mvcollection", &["editor", "title", "date"], &["volumes", "publisher", "location", "note"]),
    std_type("incollection", &["author", "title", "booktitle", "date"], &["editor", "pages", "publisher", "location", "note"]),
    std_type("suppcollection", &["author", "title", "booktitle", "date"], &["editor", "pages", "publisher", "location", "note"]),
    std_type("manual", &["title", "date"], &["author", "editor", "organization", "location", "note"]),
    std_type("misc", &["title", "date"], &["author", "editor", "howpublished", "organization", "note"]),
    std_type("online", &["title", "date", "url"], &["author", "editor", "urldate", "note"]),
    std_type("patent", &["author", "title", "number", "date"], &["holder", "type", "location", "note"]),
    std_type("periodical", &["editor", "title", "date"], &["volume", "number", "issue", "note"]),
    std_type("suppperiodical", &["author", "title", "journaltitle", "date"], &["volume", "number", "pages", "note"]),
    std_type("proceedings", &["title", "date"], &["editor", "volume", "series", "publisher", "location", "note"]),
    std_type("mvproceedings", &["title", "date"], &["editor", "volumes", "publisher", "location", "note"]),
    std_type("inproceedings", &["author", "title", "booktitle", "date"], &["editor", "pages", "publisher", "location", "note"]),
    std_type("reference", &["editor", "title", "date"], &["volume", "publisher", "location", "note"]),
    std_type("mvreference", &["editor", "title", "date"], &["volumes", "publisher", "location", "note"]),
    std_type("inreference", &["author", "title", "booktitle", "date"], &["editor", "pages", "publisher", "location", "note"]),
    std_type("report", &["author", "title", "type", "institution", "date"], &["number", "location", "note"]),
    std_type("set", &["entryset"], &[]),
    std_type("thesis", &["author", "title", "type", "institution", "date"], &["location", "note"]),
    std_type("unpublished", &["author", "title", "date"], &["howpublished", "note"]),
    std_type("dataset", &["title", "date"], &["author", "editor", "version", "publisher", "url", "note"]),
    std_type("software", &["title", "date"], &["author", "version", "url", "note"]),
    std_type("conference", &["author", "title", "booktitle", "date"], &["editor", "pages", "publisher", "location", "note"]),
    std_type("mastersthesis", &["author", "title", "institution", "date"], &["type", "location", "note"]),
    std_type("phdthesis", &["author", "title", "institution", "date"], &["type", "location", "note"]),
    std_type("techreport", &["author", "title", "institution", "date"], &["type", "number", "location", "note"]),
];

fn standard_types(mode: DatabaseMode) -> &'static [StandardType] {
    match mode {
        DatabaseMode::BibTex => BIBTEX_TYPES,
        DatabaseMode::BibLatex => BIBLATEX_TYPES,
    }
}

/// Returns true if `name` is a standard type in `mode`.
#[must_use]
pub fn is_standard_type(name: &str, mode: DatabaseMode) -> bool {
    standard_types(mode)
        .iter()
        .any(|t| t.name.eq_ignore_ascii_case(name))
}

/// Name and field lists of an entry type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryTypeSpec {
    name: String,
    #[serde(default)]
    required: Vec<String>,
    #[serde(default)]
    optional: Vec<String>,
}

impl EntryTypeSpec {
    /// Creates a type specification.
    pub fn new<R, O>(name: impl Into<String>, required: R, optional: O) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        Self {
            name: name.into(),
            required: required.into_iter().map(Into::into).collect(),
            optional: optional.into_iter().map(Into::into).collect(),
        }
    }

    fn from_standard(t: &StandardType) -> Self {
        Self::new(t.name, t.required.iter().copied(), t.optional.iter().copied())
    }

    /// Returns the type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the required fields.
    #[must_use]
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Returns the optional fields.
    #[must_use]
    pub fn optional(&self) -> &[String] {
        &self.optional
    }
}

/// A resolved entry type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDefinition {
    /// Predefined by the format, possibly with user-customized fields.
    Standard(EntryTypeSpec),
    /// User-defined; must be written alongside records using it.
    Custom(EntryTypeSpec),
}

impl TypeDefinition {
    /// Returns the field lists regardless of kind.
    #[must_use]
    pub fn spec(&self) -> &EntryTypeSpec {
        match self {
            Self::Standard(spec) | Self::Custom(spec) => spec,
        }
    }

    /// Returns true for custom types.
    #[must_use]
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

/// User-defined and customized entry types, per mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRegistry {
    #[serde(default)]
    bibtex: BTreeMap<String, EntryTypeSpec>,
    #[serde(default)]
    biblatex: BTreeMap<String, EntryTypeSpec>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, mode: DatabaseMode) -> &BTreeMap<String, EntryTypeSpec> {
        match mode {
            DatabaseMode::BibTex => &self.bibtex,
            DatabaseMode::BibLatex => &self.biblatex,
        }
    }

    /// Registers a custom type, or customizes a standard one.
    pub fn register(&mut self, mode: DatabaseMode, spec: EntryTypeSpec) {
        let table = match mode {
            DatabaseMode::BibTex => &mut self.bibtex,
            DatabaseMode::BibLatex => &mut self.biblatex,
        };
        table.insert(spec.name.to_ascii_lowercase(), spec);
    }

    /// Resolves a type tag.
    ///
    /// Standard names always resolve to [`TypeDefinition::Standard`], using
    /// a registered customization's fields when present. Returns `None` for
    /// a non-standard tag with no registered definition.
    #[must_use]
    pub fn resolve(&self, type_tag: &str, mode: DatabaseMode) -> Option<TypeDefinition> {
        let lower = type_tag.to_ascii_lowercase();
        let registered = self.table(mode).get(&lower);

        if let Some(standard) = standard_types(mode).iter().find(|t| t.name == lower) {
            let spec = registered
                .cloned()
                .unwrap_or_else(|| EntryTypeSpec::from_standard(standard));
            return Some(TypeDefinition::Standard(spec));
        }

        registered.cloned().map(TypeDefinition::Custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_lookup_is_case_insensitive() {
        assert!(is_standard_type("Article", DatabaseMode::BibTex));
        assert!(is_standard_type("online", DatabaseMode::BibLatex));
        assert!(!is_standard_type("online", DatabaseMode::BibTex));
    }

    #[test]
    fn resolve_standard() {
        let registry = TypeRegistry::new();
        let def = registry.resolve("ARTICLE", DatabaseMode::BibTex).unwrap();
        assert!(!def.is_custom());
        assert_eq!(def.spec().required()[0], "author");
    }

    #[test]
    fn customized_standard_stays_standard() {
        let mut registry = TypeRegistry::new();
        registry.register(
            DatabaseMode::BibTex,
            EntryTypeSpec::new("article", ["title"], ["doi"]),
        );
        let def = registry.resolve("article", DatabaseMode::BibTex).unwrap();
        assert!(!def.is_custom());
        assert_eq!(def.spec().optional(), ["doi".to_string()]);
    }

    #[test]
    fn resolve_custom_and_unknown() {
        let mut registry = TypeRegistry::new();
        registry.register(
            DatabaseMode::BibTex,
            EntryTypeSpec::new("Dataset", ["title", "url"], ["version"]),
        );

        let def = registry.resolve("dataset", DatabaseMode::BibTex).unwrap();
        assert!(def.is_custom());
        assert_eq!(def.spec().name(), "Dataset");

        // Registered for BibTeX only
        assert!(registry.resolve("video", DatabaseMode::BibTex).is_none());
        assert!(!registry
            .resolve("dataset", DatabaseMode::BibLatex)
            .unwrap()
            .is_custom());
    }
}

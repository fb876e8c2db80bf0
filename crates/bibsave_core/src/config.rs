//! Save configuration.

use bibsave_storage::Encoding;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Whether metadata blocks are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveType {
    /// Encoding header, metadata and type definitions included.
    #[default]
    WithMetadata,
    /// Preamble, strings, records and epilog only.
    Plain,
}

/// One sort key: a field name and a direction.
///
/// An empty field name disables the criterion.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortCriterion {
    /// Field to compare, including the `bibtexkey` and `entrytype` pseudo-fields.
    pub field: String,
    /// Reverse the comparison.
    #[serde(default)]
    pub descending: bool,
}

impl SortCriterion {
    /// Sorts by `field` in ascending order.
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    /// Sorts by `field` in descending order.
    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    /// A disabled criterion.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns true if the criterion takes part in sorting.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.field.trim().is_empty()
    }
}

impl fmt::Display for SortCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "{}:desc", self.field)
        } else {
            f.write_str(&self.field)
        }
    }
}

impl FromStr for SortCriterion {
    type Err = String;

    /// Parses `field`, `field:asc` or `field:desc`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = s.split_once(':').unwrap_or((s, "asc"));
        let field = field.trim();
        if field.is_empty() {
            return Err(format!("missing field name in sort criterion '{s}'"));
        }
        match direction.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::ascending(field)),
            "desc" | "descending" => Ok(Self::descending(field)),
            other => Err(format!("unknown sort direction '{other}'")),
        }
    }
}

const ORIGINAL: &str = "original";
const SPECIFIED: &str = "specified";

/// Ordering stored in a database's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOrderConfig {
    /// Keep insertion order.
    pub original: bool,
    /// Up to three criteria, applied in order.
    pub criteria: [SortCriterion; 3],
}

impl SaveOrderConfig {
    /// Keep insertion order.
    #[must_use]
    pub fn original() -> Self {
        Self {
            original: true,
            criteria: Default::default(),
        }
    }

    /// Sort by `criteria`.
    #[must_use]
    pub fn specified(criteria: [SortCriterion; 3]) -> Self {
        Self {
            original: false,
            criteria,
        }
    }

    /// Parses stored values of the form
    /// `[original|specified, field1, desc1, field2, desc2, field3, desc3]`.
    ///
    /// Missing trailing criteria are disabled.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if the mode is unknown or a
    /// direction is not `true`/`false`.
    pub fn parse(values: &[String]) -> Result<Self, String> {
        let (mode, rest) = values
            .split_first()
            .ok_or_else(|| "empty save order".to_string())?;

        let original = match mode.trim() {
            ORIGINAL => true,
            SPECIFIED => false,
            other => return Err(format!("unknown save order mode '{other}'")),
        };

        if rest.len() > 6 {
            return Err(format!("expected at most 3 sort criteria, found {} values", rest.len()));
        }

        let mut criteria: [SortCriterion; 3] = Default::default();
        for (slot, pair) in criteria.iter_mut().zip(rest.chunks(2)) {
            let field = pair[0].trim().to_string();
            let descending = match pair.get(1).map(|d| d.trim()) {
                None | Some("false") => false,
                Some("true") => true,
                Some(other) => return Err(format!("invalid sort direction '{other}'")),
            };
            *slot = SortCriterion { field, descending };
        }

        Ok(Self { original, criteria })
    }

    /// Serializes back to stored metadata values.
    #[must_use]
    pub fn to_values(&self) -> Vec<String> {
        let mode = if self.original { ORIGINAL } else { SPECIFIED };
        let mut values = vec![mode.to_string()];
        for criterion in &self.criteria {
            values.push(criterion.field.clone());
            values.push(criterion.descending.to_string());
        }
        values
    }
}

/// Options for one save or export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavePreferences {
    /// Output character encoding.
    pub encoding: Encoding,
    /// Copy the previous file to `<dest>.bak` before replacing it.
    pub make_backup: bool,
    /// Whether metadata is written.
    pub save_type: SaveType,
    /// A save of the whole database (as opposed to an export).
    pub is_save_operation: bool,
    /// Exports keep insertion order instead of using `sort_criteria`.
    pub export_in_original_order: bool,
    /// Criteria used when no stored order applies.
    pub sort_criteria: [SortCriterion; 3],
    /// Freshly format unchanged records and strings too.
    pub reformat_unchanged: bool,
    /// Directory for the temporary output (defaults to the destination's).
    pub staging_dir: Option<PathBuf>,
}

impl Default for SavePreferences {
    fn default() -> Self {
        Self {
            encoding: Encoding::Utf8,
            make_backup: true,
            save_type: SaveType::WithMetadata,
            is_save_operation: true,
            export_in_original_order: false,
            sort_criteria: [
                SortCriterion::ascending("author"),
                SortCriterion::ascending("editor"),
                SortCriterion::ascending("year"),
            ],
            reformat_unchanged: false,
            staging_dir: None,
        }
    }
}

impl SavePreferences {
    /// Creates preferences with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Preferences for exporting a selection: plain, no backup, not a database save.
    #[must_use]
    pub fn export() -> Self {
        Self::default()
            .save_type(SaveType::Plain)
            .make_backup(false)
            .is_save_operation(false)
    }

    /// Sets the output encoding.
    #[must_use]
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Sets whether a backup is made.
    #[must_use]
    pub fn make_backup(mut self, value: bool) -> Self {
        self.make_backup = value;
        self
    }

    /// Sets the save type.
    #[must_use]
    pub fn save_type(mut self, save_type: SaveType) -> Self {
        self.save_type = save_type;
        self
    }

    /// Sets whether this is a whole-database save.
    #[must_use]
    pub fn is_save_operation(mut self, value: bool) -> Self {
        self.is_save_operation = value;
        self
    }

    /// Sets whether exports keep insertion order.
    #[must_use]
    pub fn export_in_original_order(mut self, value: bool) -> Self {
        self.export_in_original_order = value;
        self
    }

    /// Sets whether unchanged items are reformatted.
    #[must_use]
    pub fn reformat_unchanged(mut self, value: bool) -> Self {
        self.reformat_unchanged = value;
        self
    }

    /// Sets the sort criteria.
    #[must_use]
    pub fn sort_criteria(mut self, criteria: [SortCriterion; 3]) -> Self {
        self.sort_criteria = criteria;
        self
    }

    /// Sets the staging directory for the temporary output.
    #[must_use]
    pub fn staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    /// Returns true if metadata blocks are written.
    #[must_use]
    pub fn writes_metadata(&self) -> bool {
        self.save_type == SaveType::WithMetadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn default_preferences() {
        let prefs = SavePreferences::default();
        assert!(prefs.make_backup);
        assert!(prefs.is_save_operation);
        assert!(prefs.writes_metadata());
        assert_eq!(prefs.sort_criteria[0].field, "author");
    }

    #[test]
    fn builder_pattern() {
        let prefs = SavePreferences::new()
            .encoding(Encoding::UsAscii)
            .save_type(SaveType::Plain)
            .reformat_unchanged(true)
            .sort_criteria([
                SortCriterion::descending("year"),
                SortCriterion::none(),
                SortCriterion::none(),
            ]);

        assert_eq!(prefs.encoding, Encoding::UsAscii);
        assert!(!prefs.writes_metadata());
        assert!(prefs.reformat_unchanged);
        assert!(!prefs.sort_criteria[1].is_enabled());

        let export = SavePreferences::export();
        assert!(!export.is_save_operation);
        assert!(!export.make_backup);
    }

    #[test]
    fn parse_stored_order() {
        let config =
            SaveOrderConfig::parse(&strings(&["specified", "year", "true", "author", "false", "", "false"]))
                .unwrap();
        assert!(!config.original);
        assert_eq!(config.criteria[0], SortCriterion::descending("year"));
        assert_eq!(config.criteria[1], SortCriterion::ascending("author"));
        assert!(!config.criteria[2].is_enabled());
        assert_eq!(SaveOrderConfig::parse(&config.to_values()).unwrap(), config);
    }

    #[test]
    fn parse_short_and_original() {
        let config = SaveOrderConfig::parse(&strings(&["original"])).unwrap();
        assert_eq!(config, SaveOrderConfig::original());

        let config = SaveOrderConfig::parse(&strings(&["specified", "title"])).unwrap();
        assert_eq!(config.criteria[0], SortCriterion::ascending("title"));
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(SaveOrderConfig::parse(&[]).is_err());
        assert!(SaveOrderConfig::parse(&strings(&["sideways"])).is_err());
        assert!(SaveOrderConfig::parse(&strings(&["specified", "year", "maybe"])).is_err());
        assert!(SaveOrderConfig::parse(&strings(&[
            "specified", "a", "true", "b", "true", "c", "true", "d", "true"
        ]))
        .is_err());
    }

    #[test]
    fn criterion_from_str() {
        assert_eq!("year".parse::<SortCriterion>().unwrap(), SortCriterion::ascending("year"));
        assert_eq!(
            "author:desc".parse::<SortCriterion>().unwrap(),
            SortCriterion::descending("author")
        );
        assert!(":desc".parse::<SortCriterion>().is_err());
        assert!("year:up".parse::<SortCriterion>().is_err());
        assert_eq!(SortCriterion::descending("year").to_string(), "year:desc");
    }
}

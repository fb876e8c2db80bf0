//! Property-based test generators using proptest.
//!
//! Strategies produce databases the writer accepts: keys are unique, field
//! values contain no `#` or braces, and string references always name an
//! existing definition.

use bibsave_core::{Database, DatabaseContext, Record, RecordId, SortCriterion, StringMacro};
use proptest::prelude::*;

/// Entry types drawn by [`record_strategy`].
pub const ENTRY_TYPES: [&str; 5] = ["article", "book", "inproceedings", "misc", "techreport"];

/// Field names drawn by [`record_strategy`] and [`sort_criterion_strategy`].
pub const FIELD_NAMES: [&str; 7] = ["author", "editor", "title", "year", "journal", "pages", "note"];

/// Strategy for generating citation keys.
pub fn key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9]{0,11}").expect("Invalid regex")
}

/// Strategy for generating field values the formatter accepts.
pub fn field_value_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9 .,:-]{1,24}").expect("Invalid regex")
}

/// Strategy for generating arbitrary field values, including ones the
/// formatter must reject.
pub fn raw_value_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex(r"[a-z #{}\\\x00-\x1f]{0,16}").expect("Invalid regex")
}

/// Strategy for generating fields of one record.
pub fn fields_strategy() -> impl Strategy<Value = Vec<(&'static str, String)>> {
    prop::collection::vec((prop::sample::select(FIELD_NAMES.to_vec()), field_value_strategy()), 0..5)
}

/// Strategy for generating a record with the given ID and key.
pub fn record_strategy(id: u64, key: String) -> impl Strategy<Value = Record> {
    (prop::sample::select(ENTRY_TYPES.to_vec()), fields_strategy()).prop_map(move |(entry_type, fields)| {
        fields
            .into_iter()
            .fold(Record::new(RecordId::new(id), entry_type).with_key(key.clone()), |record, (name, value)| {
                record.with_field(name, value)
            })
    })
}

/// Strategy for generating a database of up to `max_records` records.
///
/// Records get IDs `1..` and keys made unique by an `_index` suffix.
pub fn database_strategy(max_records: usize) -> impl Strategy<Value = DatabaseContext> {
    prop::collection::vec(
        (prop::sample::select(ENTRY_TYPES.to_vec()), key_strategy(), fields_strategy()),
        0..=max_records,
    )
    .prop_map(|rows| {
        let mut db = Database::new();
        for (i, (entry_type, key, fields)) in rows.into_iter().enumerate() {
            let mut record = Record::new(RecordId::new(i as u64 + 1), entry_type).with_key(format!("{key}_{i}"));
            for (name, value) in fields {
                record.set_field(name, value);
            }
            db.insert_record(record);
        }
        DatabaseContext::new(db)
    })
}

/// Strategy for generating string definitions that reference each other.
///
/// Each definition is either a literal or a reference to another
/// definition, so chains and cycles both occur.
pub fn macro_set_strategy(max_strings: usize) -> impl Strategy<Value = Vec<StringMacro>> {
    prop::collection::btree_set(prop::string::string_regex("[a-z][a-z0-9_]{0,5}").expect("Invalid regex"), 1..=max_strings)
        .prop_flat_map(|names| {
            let names: Vec<String> = names.into_iter().collect();
            let count = names.len();
            (
                Just(names),
                prop::collection::vec((prop::option::of(0..count), field_value_strategy()), count),
            )
        })
        .prop_map(|(names, contents)| {
            names
                .iter()
                .zip(contents)
                .map(|(name, (target, literal))| match target {
                    Some(i) => StringMacro::new(name.clone(), format!("#{}#", names[i])),
                    None => StringMacro::new(name.clone(), literal),
                })
                .collect()
        })
}

/// Strategy for generating one sort criterion.
pub fn sort_criterion_strategy() -> impl Strategy<Value = SortCriterion> {
    (prop::sample::select(FIELD_NAMES.to_vec()), any::<bool>()).prop_map(|(field, descending)| {
        if descending {
            SortCriterion::descending(field)
        } else {
            SortCriterion::ascending(field)
        }
    })
}

/// Strategy for generating a full set of three criteria, some possibly disabled.
pub fn sort_criteria_strategy() -> impl Strategy<Value = [SortCriterion; 3]> {
    prop::array::uniform3(prop_oneof![
        4 => sort_criterion_strategy(),
        1 => Just(SortCriterion::none()),
    ])
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn database_keys_are_unique(ctx in database_strategy(12)) {
            let keys: HashSet<_> = ctx.database.records().iter().filter_map(|r| r.key()).collect();
            prop_assert_eq!(keys.len(), ctx.database.records().len());
        }

        #[test]
        fn macro_references_resolve(strings in macro_set_strategy(6)) {
            let names: HashSet<_> = strings.iter().map(|s| s.name().to_string()).collect();
            for string in &strings {
                for name in bibsave_core::string_references(string.content()) {
                    prop_assert!(names.contains(name));
                }
            }
        }

        #[test]
        fn field_values_have_no_markup(value in field_value_strategy()) {
            prop_assert!(!value.contains(['#', '{', '}']), "value contains forbidden char: {:?}", value);
        }
    }
}

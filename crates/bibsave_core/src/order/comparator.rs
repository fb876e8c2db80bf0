//! Record comparators.

use crate::model::{Record, RecordId, KEY_FIELD};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Compares two records for output order.
pub trait RecordComparator: fmt::Debug {
    /// Returns the relative order of `a` and `b`.
    fn compare(&self, a: &Record, b: &Record) -> Ordering;
}

/// Ordered list of comparators; the first non-equal result wins.
#[derive(Debug, Default)]
pub struct ComparatorStack {
    comparators: Vec<Box<dyn RecordComparator>>,
}

impl ComparatorStack {
    /// Creates an empty stack. An empty stack considers all records equal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a comparator with lower precedence than those already present.
    #[must_use]
    pub fn then(mut self, comparator: impl RecordComparator + 'static) -> Self {
        self.comparators.push(Box::new(comparator));
        self
    }

    /// Returns the number of comparators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.comparators.len()
    }

    /// Returns true if the stack has no comparators.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.comparators.is_empty()
    }
}

impl RecordComparator for ComparatorStack {
    fn compare(&self, a: &Record, b: &Record) -> Ordering {
        self.comparators
            .iter()
            .map(|c| c.compare(a, b))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

/// Creation order.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdComparator;

impl RecordComparator for IdComparator {
    fn compare(&self, a: &Record, b: &Record) -> Ordering {
        a.id().cmp(&b.id())
    }
}

/// Orders by one field's value.
///
/// Values are compared case-insensitively with braces removed. Integers
/// compare numerically and sort before text. A missing value sorts as the
/// empty string, before everything else. Name fields compare on last names
/// first.
#[derive(Debug, Clone)]
pub struct FieldComparator {
    field: String,
    descending: bool,
}

impl FieldComparator {
    /// Ascending comparison on `field`.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into().trim().to_ascii_lowercase(),
            descending: false,
        }
    }

    /// Comparison on `field` in the given direction.
    pub fn with_direction(field: impl Into<String>, descending: bool) -> Self {
        Self {
            descending,
            ..Self::new(field)
        }
    }

    /// Comparison on the citation key.
    #[must_use]
    pub fn key() -> Self {
        Self::new(KEY_FIELD)
    }

    fn sort_value(&self, record: &Record) -> String {
        let raw = record.field(&self.field).unwrap_or_default();
        let cleaned: String = raw
            .chars()
            .filter(|c| *c != '{' && *c != '}')
            .collect::<String>()
            .to_lowercase();
        if is_name_field(&self.field) {
            names_last_first(&cleaned)
        } else {
            cleaned.trim().to_string()
        }
    }
}

fn is_name_field(field: &str) -> bool {
    matches!(field, "author" | "editor")
}

/// Rewrites `"Donald E. Knuth and Lamport, Leslie"` as
/// `"knuth donald e. and lamport leslie"` style keys.
fn names_last_first(names: &str) -> String {
    names
        .split(" and ")
        .map(|name| {
            let name = name.trim();
            if let Some((last, first)) = name.split_once(',') {
                format!("{} {}", last.trim(), first.trim())
            } else if let Some((first, last)) = name.rsplit_once(' ') {
                format!("{} {}", last.trim(), first.trim())
            } else {
                name.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" and ")
}

/// Empty values first, then integers numerically, then text.
///
/// Keeping the classes apart makes the order total even when integers and
/// text share a field.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey<'a> {
    Empty,
    Number(i64, &'a str),
    Text(&'a str),
}

impl<'a> SortKey<'a> {
    fn of(value: &'a str) -> Self {
        if value.is_empty() {
            Self::Empty
        } else if let Ok(n) = value.parse::<i64>() {
            Self::Number(n, value)
        } else {
            Self::Text(value)
        }
    }
}

impl RecordComparator for FieldComparator {
    fn compare(&self, a: &Record, b: &Record) -> Ordering {
        let ordering = SortKey::of(&self.sort_value(a)).cmp(&SortKey::of(&self.sort_value(b)));
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

/// Places referenced records before the records cross-referencing them.
///
/// Each record gets a depth: 0 without a resolvable `crossref`, else one
/// more than its target. Depths are computed over the records being saved
/// only, and reference cycles are cut where they close.
#[derive(Debug, Clone, Default)]
pub struct CrossRefComparator {
    depths: HashMap<RecordId, usize>,
}

impl CrossRefComparator {
    /// Computes depths for `records`.
    #[must_use]
    pub fn new(records: &[&Record]) -> Self {
        let by_key: HashMap<&str, &Record> = records
            .iter()
            .filter_map(|r| r.key().map(|k| (k, *r)))
            .collect();

        let mut depths = HashMap::with_capacity(records.len());
        for record in records {
            let depth = chain_depth(record, &by_key);
            depths.insert(record.id(), depth);
        }
        Self { depths }
    }

    /// Returns the depth assigned to `id`.
    #[must_use]
    pub fn depth(&self, id: RecordId) -> usize {
        self.depths.get(&id).copied().unwrap_or(0)
    }
}

fn chain_depth(record: &Record, by_key: &HashMap<&str, &Record>) -> usize {
    let mut seen = HashSet::new();
    seen.insert(record.id());
    let mut depth = 0;
    let mut current = record;
    while let Some(target) = current.crossref().and_then(|key| by_key.get(key)) {
        if !seen.insert(target.id()) {
            break;
        }
        depth += 1;
        current = target;
    }
    depth
}

impl RecordComparator for CrossRefComparator {
    fn compare(&self, a: &Record, b: &Record) -> Ordering {
        self.depth(a.id()).cmp(&self.depth(b.id()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: u64) -> Record {
        Record::new(RecordId::new(id), "misc")
    }

    #[test]
    fn stack_first_non_equal_wins() {
        let a = rec(1).with_field("year", "2000").with_key("b");
        let b = rec(2).with_field("year", "2000").with_key("a");
        let stack = ComparatorStack::new()
            .then(FieldComparator::new("year"))
            .then(FieldComparator::key())
            .then(IdComparator);

        assert_eq!(stack.len(), 3);
        assert_eq!(stack.compare(&a, &b), Ordering::Greater);
        assert_eq!(ComparatorStack::new().compare(&a, &b), Ordering::Equal);
    }

    #[test]
    fn field_comparison_rules() {
        let by_title = FieldComparator::new("title");
        let a = rec(1).with_field("title", "{B}eta");
        let b = rec(2).with_field("title", "alpha");
        assert_eq!(by_title.compare(&a, &b), Ordering::Greater);

        // Missing sorts lowest
        assert_eq!(by_title.compare(&rec(3), &b), Ordering::Less);

        let by_volume = FieldComparator::new("volume");
        let v9 = rec(1).with_field("volume", "9");
        let v10 = rec(2).with_field("volume", "10");
        assert_eq!(by_volume.compare(&v9, &v10), Ordering::Less);

        let desc = FieldComparator::with_direction("volume", true);
        assert_eq!(desc.compare(&v9, &v10), Ordering::Greater);

        // Mixed integers and text stay transitive
        let v1a = rec(3).with_field("volume", "1a");
        assert_eq!(by_volume.compare(&v10, &v1a), Ordering::Less);
        assert_eq!(by_volume.compare(&v9, &v1a), Ordering::Less);
        assert_eq!(by_volume.compare(&rec(4), &v9), Ordering::Less);
    }

    #[test]
    fn names_compare_by_last_name() {
        let by_author = FieldComparator::new("author");
        let knuth = rec(1).with_field("author", "Donald Knuth");
        let lamport = rec(2).with_field("author", "Lamport, Leslie");
        assert_eq!(by_author.compare(&knuth, &lamport), Ordering::Less);
        assert_eq!(names_last_first("donald e. knuth"), "knuth donald e.");
    }

    #[test]
    fn pseudo_fields() {
        let a = rec(1).with_key("zeta");
        let b = Record::new(RecordId::new(2), "article").with_key("alpha");
        assert_eq!(FieldComparator::key().compare(&a, &b), Ordering::Greater);
        assert_eq!(FieldComparator::new("entrytype").compare(&a, &b), Ordering::Greater);
    }

    #[test]
    fn crossref_depths() {
        let book = rec(1).with_key("book");
        let chapter = rec(2).with_key("ch").with_field("crossref", "book");
        let section = rec(3).with_key("sec").with_field("crossref", "ch");
        let orphan = rec(4).with_key("o").with_field("crossref", "missing");

        let cmp = CrossRefComparator::new(&[&section, &chapter, &book, &orphan]);
        assert_eq!(cmp.depth(book.id()), 0);
        assert_eq!(cmp.depth(chapter.id()), 1);
        assert_eq!(cmp.depth(section.id()), 2);
        assert_eq!(cmp.depth(orphan.id()), 0);
        assert_eq!(cmp.compare(&chapter, &book), Ordering::Greater);
    }

    #[test]
    fn crossref_cycles_terminate() {
        let a = rec(1).with_key("a").with_field("crossref", "b");
        let b = rec(2).with_key("b").with_field("crossref", "a");
        let own = rec(3).with_key("self").with_field("crossref", "self");

        let cmp = CrossRefComparator::new(&[&a, &b, &own]);
        assert_eq!(cmp.depth(a.id()), 1);
        assert_eq!(cmp.depth(b.id()), 1);
        assert_eq!(cmp.depth(own.id()), 0);
    }
}

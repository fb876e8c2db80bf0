//! Ordering engine.
//!
//! Picks an [`OrderStrategy`] from the preferences and the database's stored
//! save order, builds the matching [`ComparatorStack`] and sorts:
//!
//! | Strategy    | Stack                                                  |
//! |-------------|--------------------------------------------------------|
//! | `Original`  | crossref, id                                           |
//! | `Specified` | crossref (database saves), fields 1-3, key, id         |
//!
//! Every stack ends with [`IdComparator`], so the order is total.

mod comparator;

pub use comparator::{
    ComparatorStack, CrossRefComparator, FieldComparator, IdComparator, RecordComparator,
};

use crate::config::{SavePreferences, SortCriterion};
use crate::model::{DatabaseContext, MetaData, Record, RecordId};
use std::collections::HashSet;
use tracing::debug;

/// How records are ordered in the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderStrategy {
    /// Insertion order, with cross-referenced records moved first.
    Original,
    /// Sorted by up to three criteria, then key.
    Specified([SortCriterion; 3]),
}

/// Chooses the strategy for one save.
///
/// Database saves follow the stored save order and fall back to insertion
/// order when none is stored. Exports follow the preferences.
#[must_use]
pub fn select_strategy(prefs: &SavePreferences, metadata: &MetaData) -> OrderStrategy {
    if prefs.is_save_operation {
        match metadata.save_order_config() {
            Some(stored) if !stored.original => OrderStrategy::Specified(stored.criteria),
            _ => OrderStrategy::Original,
        }
    } else if prefs.export_in_original_order {
        OrderStrategy::Original
    } else {
        OrderStrategy::Specified(prefs.sort_criteria.clone())
    }
}

/// Builds the comparator stack for `strategy` over the records being saved.
#[must_use]
pub fn build_stack(
    strategy: &OrderStrategy,
    records: &[&Record],
    is_save_operation: bool,
) -> ComparatorStack {
    match strategy {
        OrderStrategy::Original => ComparatorStack::new()
            .then(CrossRefComparator::new(records))
            .then(IdComparator),
        OrderStrategy::Specified(criteria) => {
            let mut stack = ComparatorStack::new();
            if is_save_operation {
                stack = stack.then(CrossRefComparator::new(records));
            }
            for criterion in criteria.iter().filter(|c| c.is_enabled()) {
                stack = stack.then(FieldComparator::with_direction(
                    criterion.field.as_str(),
                    criterion.descending,
                ));
            }
            stack.then(FieldComparator::key()).then(IdComparator)
        }
    }
}

/// Returns the records to write, in output order.
///
/// When `filter` is given only records whose ID it contains take part.
#[must_use]
pub fn sorted_records<'a>(
    ctx: &'a DatabaseContext,
    filter: Option<&HashSet<RecordId>>,
    prefs: &SavePreferences,
) -> Vec<&'a Record> {
    let mut records: Vec<&Record> = ctx
        .database
        .records()
        .iter()
        .filter(|r| filter.map_or(true, |ids| ids.contains(&r.id())))
        .collect();

    let strategy = select_strategy(prefs, &ctx.metadata);
    debug!(?strategy, records = records.len(), "ordering records");

    let stack = build_stack(&strategy, &records, prefs.is_save_operation);
    records.sort_by(|a, b| stack.compare(a, b));
    records
}

//! Order command implementation.

use super::{load_context, CliError, OutputOptions};
use bibsave_core::order::select_strategy;
use bibsave_core::sorted_records;
use serde::Serialize;
use std::path::Path;

/// One record in the resolved output order.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct OrderedRecord {
    /// Position in the output, starting at 1.
    pub position: usize,
    /// Record ID.
    pub id: u64,
    /// Citation key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Type tag.
    #[serde(rename = "type")]
    pub entry_type: String,
}

/// Resolves the output order.
pub fn resolve(input: &Path, options: &OutputOptions) -> Result<Vec<OrderedRecord>, CliError> {
    let ctx = load_context(input)?;
    let prefs = options.preferences()?;
    let strategy = select_strategy(&prefs, &ctx.metadata);
    tracing::info!(?strategy, "resolved ordering strategy");

    Ok(sorted_records(&ctx, None, &prefs)
        .into_iter()
        .enumerate()
        .map(|(i, r)| OrderedRecord {
            position: i + 1,
            id: r.id().as_u64(),
            key: r.key().map(str::to_string),
            entry_type: r.entry_type().to_string(),
        })
        .collect())
}

/// Runs the order command.
pub fn run(input: &Path, options: &OutputOptions, format: &str) -> Result<(), CliError> {
    let records = resolve(input, options)?;
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&records)?),
        _ => {
            println!("{:>4}  {:>8}  {:<16}  KEY", "#", "ID", "TYPE");
            for r in &records {
                println!(
                    "{:>4}  {:>8}  {:<16}  {}",
                    r.position,
                    r.id,
                    r.entry_type,
                    r.key.as_deref().unwrap_or("-")
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bibsave_core::{Database, DatabaseContext, Record, RecordId};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn crossref_target_listed_first() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("db.json");
        let mut db = Database::new();
        db.insert_record(Record::new(RecordId::new(1), "misc").with_key("a"));
        db.insert_record(
            Record::new(RecordId::new(2), "inbook")
                .with_key("b")
                .with_field("crossref", "c"),
        );
        db.insert_record(Record::new(RecordId::new(3), "book").with_key("c"));
        fs::write(&input, serde_json::to_string(&DatabaseContext::new(db)).unwrap()).unwrap();

        let options = OutputOptions {
            encoding: "UTF-8".into(),
            plain: false,
            export: false,
            original_order: false,
            sort: Vec::new(),
            reformat: false,
        };
        let ids: Vec<u64> = resolve(&input, &options).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
    }
}

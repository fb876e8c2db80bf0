//! Custom entry type definitions.

use crate::error::SaveResult;
use crate::model::{is_standard_type, DatabaseMode, EntryTypeSpec, Record, TypeDefinition, TypeRegistry};
use bibsave_storage::TextSink;
use std::collections::BTreeMap;

const ENTRY_TYPE_FLAG: &str = "jabref-entrytype: ";

/// Collects the custom types used by written records.
#[derive(Debug, Default)]
pub(crate) struct TypeCollector {
    types: BTreeMap<String, EntryTypeSpec>,
}

impl TypeCollector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records the type of `record` if it is custom and defined.
    pub(crate) fn observe(&mut self, record: &Record, registry: &TypeRegistry, mode: DatabaseMode) {
        if is_standard_type(record.entry_type(), mode) {
            return;
        }
        if let Some(TypeDefinition::Custom(spec)) = registry.resolve(record.entry_type(), mode) {
            self.types.insert(spec.name().to_string(), spec);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.types.len()
    }

    /// Writes the collected definitions sorted by name.
    pub(crate) fn write<S: TextSink + ?Sized>(&self, sink: &mut S) -> SaveResult<()> {
        for spec in self.types.values() {
            sink.write_str(&format!(
                "\n@Comment{{{ENTRY_TYPE_FLAG}{}: req[{}] opt[{}]}}\n",
                spec.name(),
                spec.required().join(";"),
                spec.optional().join(";")
            ))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordId;
    use bibsave_storage::MemorySink;

    #[test]
    fn collects_custom_types_once() {
        let mut registry = TypeRegistry::new();
        registry.register(
            DatabaseMode::BibTex,
            EntryTypeSpec::new("Video", ["title", "url"], ["year"]),
        );
        registry.register(DatabaseMode::BibTex, EntryTypeSpec::new("Dataset", ["url"], Vec::<String>::new()));
        registry.register(DatabaseMode::BibTex, EntryTypeSpec::new("article", ["title"], ["doi"]));

        let mut collector = TypeCollector::new();
        for (id, tag) in ["video", "article", "dataset", "video", "podcast"].iter().enumerate() {
            let record = Record::new(RecordId::new(id as u64), *tag);
            collector.observe(&record, &registry, DatabaseMode::BibTex);
        }
        assert_eq!(collector.len(), 2);

        let mut sink = MemorySink::new();
        collector.write(&mut sink).unwrap();
        assert_eq!(
            sink.into_string(),
            "\n@Comment{jabref-entrytype: Dataset: req[url] opt[]}\n\
             \n@Comment{jabref-entrytype: Video: req[title;url] opt[year]}\n"
        );
    }
}

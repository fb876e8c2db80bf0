//! Record statements.

use crate::error::{SaveError, SaveResult};
use crate::format::{FieldFormatter, FormatContext};
use crate::model::{Record, TypeDefinition};
use bibsave_storage::TextSink;
use std::fmt::Write as _;

/// Writes one record per call.
#[derive(Debug)]
pub(crate) struct RecordWriter<'f, F: ?Sized> {
    formatter: &'f F,
    reformat_unchanged: bool,
}

impl<'f, F: FieldFormatter + ?Sized> RecordWriter<'f, F> {
    pub(crate) fn new(formatter: &'f F, reformat_unchanged: bool) -> Self {
        Self {
            formatter,
            reformat_unchanged,
        }
    }

    /// Writes `record`.
    ///
    /// Unchanged records with stored text are written back verbatim followed
    /// by a newline. Others are formatted with fields in type order.
    pub(crate) fn write<S: TextSink + ?Sized>(
        &self,
        record: &Record,
        definition: Option<&TypeDefinition>,
        sink: &mut S,
    ) -> SaveResult<()> {
        if !record.has_changed() && !self.reformat_unchanged {
            if let Some(text) = record.parsed_serialization() {
                sink.write_str(text)?;
                sink.write_char('\n')?;
                return Ok(());
            }
        }

        let text = self.render(record, definition)?;
        sink.write_str(&text)?;
        Ok(())
    }

    fn render(&self, record: &Record, definition: Option<&TypeDefinition>) -> SaveResult<String> {
        let mut out = String::new();
        let _ = write!(
            out,
            "\n@{}{{{}",
            display_type(record.entry_type()),
            record.key().unwrap_or_default()
        );

        for name in field_order(record, definition) {
            let Some(value) = record.fields().get(name) else {
                continue;
            };
            let formatted = self
                .formatter
                .format(value, FormatContext::Field(name))
                .map_err(|e| SaveError::format(format!("field '{name}'"), e.to_string()))?;
            let _ = write!(out, ",\n  {name} = {formatted}");
        }

        out.push_str("\n}\n");
        Ok(out)
    }
}

/// `article` -> `Article`.
fn display_type(tag: &str) -> String {
    let mut chars = tag.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Required fields, then optional fields, then the rest alphabetically.
///
/// Only fields present on the record are returned, each once.
fn field_order<'r>(record: &'r Record, definition: Option<&TypeDefinition>) -> Vec<&'r str> {
    let present = record.fields();
    let mut order: Vec<&'r str> = Vec::with_capacity(present.len());

    if let Some(def) = definition {
        let spec = def.spec();
        for name in spec.required().iter().chain(spec.optional()) {
            if let Some((key, _)) = present.get_key_value(name.to_ascii_lowercase().as_str()) {
                if !order.contains(&key.as_str()) {
                    order.push(key);
                }
            }
        }
    }

    for key in present.keys() {
        if !order.contains(&key.as_str()) {
            order.push(key);
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::LatexFieldFormatter;
    use crate::model::{DatabaseMode, EntryTypeSpec, RecordId, TypeRegistry};
    use bibsave_storage::MemorySink;

    fn render(record: &Record) -> SaveResult<String> {
        let def = TypeRegistry::new().resolve(record.entry_type(), DatabaseMode::BibTex);
        let mut sink = MemorySink::new();
        RecordWriter::new(&LatexFieldFormatter, false).write(record, def.as_ref(), &mut sink)?;
        Ok(sink.into_string())
    }

    #[test]
    fn changed_record_layout() {
        let record = Record::new(RecordId::new(1), "article")
            .with_key("knuth84")
            .with_field("note", "classic")
            .with_field("abstract", "Programs as literature")
            .with_field("year", "1984")
            .with_field("title", "Literate Programming")
            .with_field("author", "Donald Knuth");

        assert_eq!(
            render(&record).unwrap(),
            "\n@Article{knuth84,\n  author = {Donald Knuth},\n  title = {Literate Programming},\n  \
             year = 1984,\n  note = {classic},\n  abstract = {Programs as literature}\n}\n"
        );
    }

    #[test]
    fn unknown_type_uses_alphabetical_order() {
        let record = Record::new(RecordId::new(1), "video")
            .with_key("v")
            .with_field("url", "http://x")
            .with_field("title", "T");
        assert_eq!(
            render(&record).unwrap(),
            "\n@Video{v,\n  title = {T},\n  url = {http://x}\n}\n"
        );
    }

    #[test]
    fn custom_definition_orders_fields() {
        let def = TypeDefinition::Custom(EntryTypeSpec::new("video", ["url"], ["title"]));
        let record = Record::new(RecordId::new(1), "video")
            .with_field("title", "T")
            .with_field("url", "u");
        let mut sink = MemorySink::new();
        RecordWriter::new(&LatexFieldFormatter, false)
            .write(&record, Some(&def), &mut sink)
            .unwrap();
        assert_eq!(sink.into_string(), "\n@Video{,\n  url = {u},\n  title = {T}\n}\n");
    }

    #[test]
    fn unchanged_record_written_verbatim() {
        let record = Record::new(RecordId::new(1), "misc")
            .with_key("m")
            .with_parsed_serialization("@misc{m, note={kept  as is}}");
        assert_eq!(render(&record).unwrap(), "@misc{m, note={kept  as is}}\n");

        let mut sink = MemorySink::new();
        RecordWriter::new(&LatexFieldFormatter, true)
            .write(&record, None, &mut sink)
            .unwrap();
        assert_eq!(sink.into_string(), "\n@Misc{m\n}\n");
    }

    #[test]
    fn field_failure_names_field() {
        let record = Record::new(RecordId::new(1), "misc").with_field("title", "{open");
        let err = render(&record).unwrap_err();
        assert!(err.to_string().contains("field 'title'"));
    }
}

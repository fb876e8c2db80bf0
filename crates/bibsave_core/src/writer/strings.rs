//! `@String` definitions.
//!
//! Definitions are written category by category, alphabetically within a
//! category. Before a definition is written, every still-pending definition
//! it references is written first, so a reference never points forward.

use crate::error::{SaveError, SaveResult};
use crate::format::{string_references, FieldFormatter, FormatContext};
use crate::model::{MacroCategory, StringMacro};
use bibsave_storage::TextSink;
use std::collections::BTreeMap;
use tracing::debug;

/// State threaded through one pass over the definitions.
#[derive(Debug)]
struct EmitState<'a> {
    /// Definitions not yet written, by name.
    pending: BTreeMap<&'a str, &'a StringMacro>,
    /// Category of the last definition written.
    previous: MacroCategory,
    /// Longest name, for value alignment.
    max_name_len: usize,
    written: usize,
}

/// Writes string definitions through a [`FieldFormatter`].
#[derive(Debug)]
pub(crate) struct StringWriter<'f, F: ?Sized> {
    formatter: &'f F,
    reformat_unchanged: bool,
}

impl<'f, F: FieldFormatter + ?Sized> StringWriter<'f, F> {
    pub(crate) fn new(formatter: &'f F, reformat_unchanged: bool) -> Self {
        Self {
            formatter,
            reformat_unchanged,
        }
    }

    /// Writes all `strings` and returns how many were written.
    pub(crate) fn write_all<S: TextSink + ?Sized>(
        &self,
        strings: &BTreeMap<String, StringMacro>,
        sink: &mut S,
    ) -> SaveResult<usize> {
        let mut sorted: Vec<&StringMacro> = strings.values().collect();
        sorted.sort_by(|a, b| {
            a.name()
                .to_lowercase()
                .cmp(&b.name().to_lowercase())
                .then_with(|| a.name().cmp(b.name()))
        });

        let mut state = EmitState {
            pending: sorted.iter().map(|s| (s.name(), *s)).collect(),
            previous: MacroCategory::Author,
            max_name_len: sorted.iter().map(|s| s.name().chars().count()).max().unwrap_or(0),
            written: 0,
        };

        for category in MacroCategory::ALL {
            for string in sorted.iter().filter(|s| s.category() == category) {
                if state.pending.contains_key(string.name()) {
                    self.write_one(*string, &mut state, sink)?;
                }
            }
        }

        debug!(strings = state.written, "wrote string definitions");
        Ok(state.written)
    }

    fn write_one<'a, S: TextSink + ?Sized>(
        &self,
        string: &'a StringMacro,
        state: &mut EmitState<'a>,
        sink: &mut S,
    ) -> SaveResult<()> {
        // Removed before recursing so reference cycles terminate
        state.pending.remove(string.name());

        for name in string_references(string.content()) {
            if let Some(referenced) = state.pending.get(name).copied() {
                self.write_one(referenced, state, sink)?;
            }
        }

        if !string.has_changed() && !self.reformat_unchanged {
            if let Some(text) = string.parsed_serialization() {
                sink.write_str(text)?;
                state.previous = string.category();
                state.written += 1;
                return Ok(());
            }
        }

        if state.previous != string.category() {
            sink.write_char('\n')?;
            state.previous = string.category();
        }

        let value = if string.content().is_empty() {
            "{}".to_string()
        } else {
            self.formatter
                .format(string.content(), FormatContext::StringMacro)
                .map_err(|e| SaveError::string_format(string.name(), &e))?
        };

        let pad = state.max_name_len.saturating_sub(string.name().chars().count());
        sink.write_str(&format!(
            "@String {{ {}{} = {} }}\n",
            string.name(),
            " ".repeat(pad),
            value
        ))?;
        state.written += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::LatexFieldFormatter;
    use bibsave_storage::MemorySink;

    fn write(strings: Vec<StringMacro>) -> SaveResult<String> {
        let map: BTreeMap<String, StringMacro> = strings
            .into_iter()
            .map(|s| (s.name().to_string(), s))
            .collect();
        let mut sink = MemorySink::new();
        StringWriter::new(&LatexFieldFormatter, false).write_all(&map, &mut sink)?;
        Ok(sink.into_string())
    }

    fn names(output: &str) -> Vec<&str> {
        output
            .lines()
            .filter_map(|l| l.strip_prefix("@String { "))
            .map(|l| l.split(' ').next().unwrap_or_default())
            .collect()
    }

    #[test]
    fn referenced_definition_comes_first() {
        let out = write(vec![
            StringMacro::new("X", "v1"),
            StringMacro::new("Y", "#X#v2"),
        ])
        .unwrap();
        assert_eq!(out, "\n@String { X = {v1} }\n@String { Y = X # {v2} }\n");
    }

    #[test]
    fn chain_is_written_in_dependency_order() {
        let out = write(vec![
            StringMacro::new("A", "#B#"),
            StringMacro::new("B", "#C#"),
            StringMacro::new("C", "end"),
        ])
        .unwrap();
        assert_eq!(names(&out), vec!["C", "B", "A"]);
    }

    #[test]
    fn names_with_digits_and_underscores_are_resolved() {
        let out = write(vec![
            StringMacro::new("A", "#z_b#"),
            StringMacro::new("z_b", "x"),
            StringMacro::new("B", "#jan2#"),
            StringMacro::new("jan2", "y"),
        ])
        .unwrap();
        assert_eq!(names(&out), vec!["z_b", "A", "jan2", "B"]);
    }

    #[test]
    fn cycle_writes_each_once() {
        let out = write(vec![
            StringMacro::new("A", "#B#"),
            StringMacro::new("B", "#A#"),
        ])
        .unwrap();
        assert_eq!(names(&out), vec!["B", "A"]);
    }

    #[test]
    fn categories_are_grouped_with_separators() {
        let out = write(vec![
            StringMacro::new("jan", "January"),
            StringMacro::new("pACM", "ACM Press"),
            StringMacro::new("aKnuth", "Donald Knuth"),
            StringMacro::new("iMIT", "MIT"),
        ])
        .unwrap();
        assert_eq!(
            out,
            "@String { aKnuth = {Donald Knuth} }\n\
             \n@String { iMIT   = {MIT} }\n\
             \n@String { pACM   = {ACM Press} }\n\
             \n@String { jan    = {January} }\n"
        );
    }

    #[test]
    fn unchanged_definition_written_verbatim() {
        let out = write(vec![
            StringMacro::new("aKnuth", "Donald Knuth")
                .with_parsed_serialization("@string{aKnuth={Donald Knuth}}\n"),
            StringMacro::new("acm", ""),
        ])
        .unwrap();
        assert_eq!(
            out,
            "@string{aKnuth={Donald Knuth}}\n\n@String { acm    = {} }\n"
        );
    }

    #[test]
    fn format_failure_names_string() {
        let err = write(vec![StringMacro::new("bad", "C# code")]).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("string 'bad'"));
        assert!(text.contains("not allowed in BibTeX strings"));
    }
}

//! Database writer.
//!
//! One save is a single pass over a [`TextSink`]:
//!
//! ```text
//! header ─▶ preamble ─▶ strings ─▶ records ─▶ metadata ─▶ type definitions ─▶ epilog
//!                                     │
//!                       ordered, transformed, filtered,
//!                       observed by the type collector
//! ```
//!
//! The header, metadata and type definitions are skipped for plain saves.
//! When writing into a [`SaveSession`], any failure cancels the session so
//! the destination is never touched.

mod entry;
mod metadata;
mod strings;
mod types;

use crate::config::SavePreferences;
use crate::error::{SaveError, SaveResult};
use crate::format::{FieldFormatter, LatexFieldFormatter};
use crate::model::{DatabaseContext, Record, RecordId};
use crate::order;
use crate::save_actions::SaveActions;
use bibsave_storage::{CommitReceipt, SaveSession, TextSink, VerifyingWriter};
use entry::RecordWriter;
use std::collections::HashSet;
use std::path::Path;
use strings::StringWriter;
use tracing::{debug, error};
use types::TypeCollector;

/// Which records take part in a write.
#[derive(Debug, Clone, Copy, Default)]
pub struct Selection<'s> {
    /// Restrict to these records; `None` means the whole database.
    pub ids: Option<&'s HashSet<RecordId>>,
    /// Skip records flagged as search hits.
    pub check_search: bool,
    /// Skip records flagged as group hits.
    pub check_group: bool,
}

impl<'s> Selection<'s> {
    /// Every record.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Only the records in `ids`.
    #[must_use]
    pub fn only(ids: &'s HashSet<RecordId>) -> Self {
        Self {
            ids: Some(ids),
            ..Self::default()
        }
    }

    /// Sets the search/group-hit exclusion flags.
    #[must_use]
    pub const fn excluding_hits(mut self, check_search: bool, check_group: bool) -> Self {
        self.check_search = check_search;
        self.check_group = check_group;
        self
    }

    fn skips(&self, record: &Record) -> bool {
        (self.check_search && record.is_search_hit()) || (self.check_group && record.is_group_hit())
    }
}

/// Counts from one write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// String definitions written.
    pub strings: usize,
    /// Records written.
    pub records: usize,
    /// Records skipped by the hit filters.
    pub skipped: usize,
    /// Metadata comment blocks written.
    pub metadata_blocks: usize,
    /// Custom type definitions written.
    pub type_definitions: usize,
}

/// Serializes a [`DatabaseContext`].
///
/// # Example
///
/// ```rust
/// use bibsave_core::{Database, DatabaseContext, DatabaseWriter, Record, RecordId, SavePreferences, Selection};
/// use bibsave_storage::MemorySink;
///
/// let mut db = Database::new();
/// db.insert_record(Record::new(RecordId::new(1), "misc").with_key("x").with_field("note", "hi"));
/// let ctx = DatabaseContext::new(db);
///
/// let mut sink = MemorySink::new();
/// DatabaseWriter::new()
///     .write_to(&ctx, Selection::all(), &SavePreferences::default(), &mut sink)
///     .unwrap();
/// assert!(sink.contents().contains("@Misc{x,\n  note = {hi}\n}"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DatabaseWriter<F = LatexFieldFormatter> {
    formatter: F,
    save_actions: SaveActions,
}

impl DatabaseWriter<LatexFieldFormatter> {
    /// Creates a writer using [`LatexFieldFormatter`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_formatter(LatexFieldFormatter)
    }
}

impl<F: FieldFormatter> DatabaseWriter<F> {
    /// Creates a writer using `formatter` for every field and string.
    pub fn with_formatter(formatter: F) -> Self {
        Self {
            formatter,
            save_actions: SaveActions::new(),
        }
    }

    /// Adds `actions` to every save, after the rules stored in metadata.
    ///
    /// Rules built from custom [`FieldTransform`](crate::FieldTransform)
    /// implementations take part in saves this way.
    #[must_use]
    pub fn with_save_actions(mut self, actions: SaveActions) -> Self {
        self.save_actions = self.save_actions.extended(&actions);
        self
    }

    /// Returns the formatter.
    pub fn formatter(&self) -> &F {
        &self.formatter
    }

    /// Writes the whole database into a new session.
    ///
    /// The returned session is open; commit it to replace the destination.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be opened or any stage fails.
    /// The session is cancelled before the error is returned.
    pub fn save_database(&self, ctx: &DatabaseContext, prefs: &SavePreferences) -> SaveResult<SaveSession> {
        self.save_selection(ctx, Selection::all(), prefs)
    }

    /// Writes `records` into a new session.
    ///
    /// # Errors
    ///
    /// As [`DatabaseWriter::save_database`].
    pub fn save_part_of_database(
        &self,
        ctx: &DatabaseContext,
        records: &[&Record],
        prefs: &SavePreferences,
        check_search: bool,
        check_group: bool,
    ) -> SaveResult<SaveSession> {
        let ids: HashSet<RecordId> = records.iter().map(|r| r.id()).collect();
        let selection = Selection::only(&ids).excluding_hits(check_search, check_group);
        self.save_selection(ctx, selection, prefs)
    }

    /// Writes the selected records into a new session.
    ///
    /// # Errors
    ///
    /// As [`DatabaseWriter::save_database`].
    pub fn save_selection(
        &self,
        ctx: &DatabaseContext,
        selection: Selection<'_>,
        prefs: &SavePreferences,
    ) -> SaveResult<SaveSession> {
        let dir = prefs.staging_dir.clone().unwrap_or_else(std::env::temp_dir);
        self.save_in(&dir, ctx, selection, prefs)
    }

    /// Writes the whole database and commits it over `destination`.
    ///
    /// The temporary output lives next to the destination unless a staging
    /// directory is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if writing or committing fails. The destination is
    /// unchanged in either case.
    pub fn save_to(
        &self,
        ctx: &DatabaseContext,
        prefs: &SavePreferences,
        destination: &Path,
    ) -> SaveResult<CommitReceipt> {
        let dir = match (&prefs.staging_dir, destination.parent()) {
            (Some(dir), _) => dir.clone(),
            (None, Some(parent)) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => ".".into(),
        };
        let mut session = self.save_in(&dir, ctx, Selection::all(), prefs)?;
        match session.commit(destination) {
            Ok(receipt) => Ok(receipt),
            Err(e) => {
                error!(path = ?destination, error = %e, "commit failed");
                let _ = session.cancel();
                Err(e.into())
            }
        }
    }

    fn save_in(
        &self,
        dir: &Path,
        ctx: &DatabaseContext,
        selection: Selection<'_>,
        prefs: &SavePreferences,
    ) -> SaveResult<SaveSession> {
        let mut session = SaveSession::open_in(dir, prefs.encoding, prefs.make_backup)?;
        let summary = fill_session(&mut session, |sink| self.write_to(ctx, selection, prefs, sink))?;
        debug!(?summary, "database written to session");
        Ok(session)
    }

    /// Writes the selected records and everything around them to `sink`.
    ///
    /// # Errors
    ///
    /// Returns the first sink or formatting failure. Failures while a
    /// record is written are wrapped in [`SaveError::Record`].
    pub fn write_to<S: TextSink + ?Sized>(
        &self,
        ctx: &DatabaseContext,
        selection: Selection<'_>,
        prefs: &SavePreferences,
        sink: &mut S,
    ) -> SaveResult<WriteSummary> {
        let mut summary = WriteSummary::default();
        let database = &ctx.database;

        if prefs.writes_metadata() {
            sink.write_str(&format!("% Encoding: {}\n", prefs.encoding))?;
        }

        if let Some(preamble) = database.preamble() {
            sink.write_str(&format!("@Preamble{{{preamble}}}\n\n"))?;
        }

        summary.strings = StringWriter::new(&self.formatter, prefs.reformat_unchanged)
            .write_all(database.strings(), sink)?;

        let sorted = order::sorted_records(ctx, selection.ids, prefs);
        let records = SaveActions::from_metadata(&ctx.metadata)
            .extended(&self.save_actions)
            .apply(&sorted);

        let record_writer = RecordWriter::new(&self.formatter, prefs.reformat_unchanged);
        let mut collector = TypeCollector::new();
        for record in &records {
            if selection.skips(record) {
                summary.skipped += 1;
                continue;
            }
            collector.observe(record, &ctx.types, ctx.mode);
            let definition = ctx.types.resolve(record.entry_type(), ctx.mode);
            record_writer
                .write(record, definition.as_ref(), sink)
                .map_err(|e| SaveError::record(record.id(), record.key(), e))?;
            summary.records += 1;
        }
        debug!(
            records = summary.records,
            skipped = summary.skipped,
            "wrote records"
        );

        if prefs.writes_metadata() {
            summary.metadata_blocks = metadata::write_metadata(&ctx.metadata, sink)?;
            collector.write(sink)?;
            summary.type_definitions = collector.len();
            debug!(types = summary.type_definitions, "wrote type definitions");
        }

        match database.epilog() {
            Some(epilog) if !epilog.is_empty() => sink.write_str(epilog)?,
            _ => sink.write_char('\n')?,
        }

        sink.flush()?;
        Ok(summary)
    }
}

/// Runs `write` against the session output, cancelling the session if it fails.
fn fill_session<W>(session: &mut SaveSession, write: W) -> SaveResult<WriteSummary>
where
    W: FnOnce(&mut VerifyingWriter) -> SaveResult<WriteSummary>,
{
    let result = session.writer().map_err(SaveError::from).and_then(write);
    if let Err(e) = &result {
        error!(error = %e, "save aborted, cancelling session");
        let _ = session.cancel();
    }
    result
}

//! Test fixtures and save helpers.
//!
//! Provides sample databases, scratch destinations and shortcuts for
//! rendering a database to a string.

use bibsave_core::{DatabaseContext, DatabaseWriter, SavePreferences, SaveResult, Selection};
use bibsave_storage::{MemorySink, BACKUP_SUFFIX, LOCK_SUFFIX};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// File name used for the destination inside a [`TestDestination`].
pub const DESTINATION_NAME: &str = "refs.bib";

/// A destination `.bib` path inside a temporary directory.
pub struct TestDestination {
    /// The destination path. The file may not exist yet.
    pub path: PathBuf,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: TempDir,
}

impl TestDestination {
    /// Creates a destination that does not exist yet.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        Self {
            path: temp_dir.path().join(DESTINATION_NAME),
            _temp_dir: temp_dir,
        }
    }

    /// Creates a destination that already holds `contents`.
    pub fn with_contents(contents: &str) -> Self {
        let dest = Self::new();
        fs::write(&dest.path, contents).expect("Failed to seed destination");
        dest
    }

    /// The directory holding the destination.
    pub fn dir(&self) -> &Path {
        self._temp_dir.path()
    }

    /// The backup path a save with backups enabled would create.
    pub fn backup_path(&self) -> PathBuf {
        self.dir().join(format!("{DESTINATION_NAME}{BACKUP_SUFFIX}"))
    }

    /// Reads the destination as UTF-8.
    pub fn read(&self) -> String {
        fs::read_to_string(&self.path).expect("Failed to read destination")
    }

    /// Reads the destination as raw bytes.
    pub fn read_bytes(&self) -> Vec<u8> {
        fs::read(&self.path).expect("Failed to read destination")
    }

    /// Returns the path of the destination's lock file.
    pub fn lock_path(&self) -> PathBuf {
        self.dir().join(format!("{DESTINATION_NAME}{LOCK_SUFFIX}"))
    }

    /// Files in the directory other than the destination, its backup and
    /// its lock file.
    ///
    /// A finished or cancelled save must leave this empty.
    pub fn leftovers(&self) -> Vec<PathBuf> {
        let backup = self.backup_path();
        let lock = self.lock_path();
        let mut found: Vec<PathBuf> = fs::read_dir(self.dir())
            .expect("Failed to list temp directory")
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| *p != self.path && *p != backup && *p != lock)
            .collect();
        found.sort();
        found
    }
}

impl Default for TestDestination {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs a test against a fresh destination.
///
/// # Example
///
/// ```rust,ignore
/// use bibsave_testkit::{scenarios, with_destination};
///
/// with_destination(|dest| {
///     DatabaseWriter::new()
///         .save_to(&scenarios::sample(), &SavePreferences::default(), &dest.path)
///         .unwrap();
///     assert!(dest.read().starts_with("% Encoding"));
/// });
/// ```
pub fn with_destination<F, R>(f: F) -> R
where
    F: FnOnce(&TestDestination) -> R,
{
    let dest = TestDestination::new();
    f(&dest)
}

/// Writes the whole database to memory.
///
/// # Errors
///
/// Returns whatever the writer reports.
pub fn try_render(ctx: &DatabaseContext, prefs: &SavePreferences) -> SaveResult<String> {
    let mut sink = MemorySink::new();
    DatabaseWriter::new().write_to(ctx, Selection::all(), prefs, &mut sink)?;
    Ok(sink.into_string())
}

/// Writes the whole database to memory, panicking on failure.
pub fn render(ctx: &DatabaseContext, prefs: &SavePreferences) -> String {
    try_render(ctx, prefs).expect("Failed to render database")
}

/// Citation keys of the `@Type{key` headers in `output`, in order.
pub fn written_keys(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|l| l.starts_with('@') && !l.starts_with("@String") && !l.starts_with("@Comment"))
        .filter(|l| !l.starts_with("@Preamble"))
        .filter_map(|l| l.split_once('{'))
        .map(|(_, rest)| rest.trim_end_matches(',').to_string())
        .collect()
}

/// Names of the `@String` definitions in `output`, in order.
pub fn written_strings(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|l| l.strip_prefix("@String { "))
        .filter_map(|l| l.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

/// Sample databases.
pub mod scenarios {
    use bibsave_core::{
        Database, DatabaseContext, DatabaseMode, EntryTypeSpec, Group, GroupContext,
        GroupTreeNode, MetaData, Record, RecordId, StringMacro, TypeRegistry,
    };

    /// A small database touching every output block.
    ///
    /// Preamble, one string, a book using it, a record of a custom type and
    /// one metadata entry.
    pub fn sample() -> DatabaseContext {
        let mut db = Database::new();
        db.set_preamble(Some("\\newcommand{\\noop}[1]{}".into()));
        db.insert_string(StringMacro::new("acm", "ACM Press"));
        db.insert_record(
            Record::new(RecordId::new(1), "book")
                .with_key("knuth")
                .with_field("title", "TAOCP")
                .with_field("publisher", "#acm#"),
        );
        db.insert_record(
            Record::new(RecordId::new(2), "video")
                .with_key("talk")
                .with_field("url", "http://example.org"),
        );

        let mut types = TypeRegistry::new();
        types.register(
            DatabaseMode::BibTex,
            EntryTypeSpec::new("Video", ["url"], ["title"]),
        );
        let mut meta = MetaData::new();
        meta.put("databaseType", vec!["bibtex".into()]);

        DatabaseContext::new(db).with_types(types).with_metadata(meta)
    }

    /// Strings `A = #B#`, `B = #C#`, `C = x`.
    pub fn macro_chain() -> DatabaseContext {
        let mut db = Database::new();
        db.insert_string(StringMacro::new("A", "#B#"));
        db.insert_string(StringMacro::new("B", "#C#"));
        db.insert_string(StringMacro::new("C", "x"));
        DatabaseContext::new(db)
    }

    /// Strings `A = #B#` and `B = #A#`.
    pub fn macro_cycle() -> DatabaseContext {
        let mut db = Database::new();
        db.insert_string(StringMacro::new("A", "#B#"));
        db.insert_string(StringMacro::new("B", "#A#"));
        DatabaseContext::new(db)
    }

    /// Records `a`, `b` (crossref to `c`) and `c`, inserted in that order.
    pub fn crossref() -> DatabaseContext {
        let mut db = Database::new();
        db.insert_record(Record::new(RecordId::new(1), "misc").with_key("a"));
        db.insert_record(
            Record::new(RecordId::new(2), "inbook")
                .with_key("b")
                .with_field("crossref", "c"),
        );
        db.insert_record(Record::new(RecordId::new(3), "book").with_key("c"));
        DatabaseContext::new(db)
    }

    /// `count` articles with keys `rec0`, `rec1`, ... and cycling authors and years.
    pub fn articles(count: usize) -> DatabaseContext {
        const AUTHORS: [&str; 4] = ["Knuth, Donald", "Lamport, Leslie", "Dijkstra, Edsger", "Hoare, Tony"];
        let mut db = Database::new();
        for i in 0..count {
            db.insert_record(
                Record::new(RecordId::new(i as u64 + 1), "article")
                    .with_key(format!("rec{i}"))
                    .with_field("author", AUTHORS[i % AUTHORS.len()])
                    .with_field("title", format!("On Problem {i}"))
                    .with_field("journal", "CACM")
                    .with_field("year", (1970 + (i * 7) % 50).to_string()),
            );
        }
        DatabaseContext::new(db)
    }

    /// [`sample`] with `children` explicit groups under the root.
    pub fn grouped(children: usize) -> DatabaseContext {
        let mut ctx = sample();
        let mut root = GroupTreeNode::root();
        for i in 0..children {
            root.add_child(GroupTreeNode::new(Group::Explicit {
                name: format!("G{i}"),
                context: GroupContext::Independent,
                keys: vec!["knuth".into()],
            }));
        }
        ctx.metadata.set_groups(root);
        ctx
    }
}

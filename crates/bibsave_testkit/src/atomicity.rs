//! Save atomicity testing.
//!
//! Provides a formatter that fails on a chosen call and a harness that
//! checks an aborted save leaves the destination byte-for-byte unchanged.

use crate::fixtures::{render, TestDestination};
use bibsave_core::{
    DatabaseContext, DatabaseWriter, FieldFormatter, FormatContext, FormatError,
    LatexFieldFormatter, SavePreferences, Selection,
};
use bibsave_storage::MemorySink;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A formatter that delegates to [`LatexFieldFormatter`] until call number
/// `fail_at` (1-based), which fails.
#[derive(Debug)]
pub struct FailingFormatter {
    inner: LatexFieldFormatter,
    fail_at: Option<usize>,
    calls: AtomicUsize,
}

impl FailingFormatter {
    /// Fails on call number `fail_at`.
    pub fn new(fail_at: usize) -> Self {
        Self {
            inner: LatexFieldFormatter,
            fail_at: Some(fail_at),
            calls: AtomicUsize::new(0),
        }
    }

    /// Never fails; only counts calls.
    pub fn counting() -> Self {
        Self {
            inner: LatexFieldFormatter,
            fail_at: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of values formatted so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FieldFormatter for FailingFormatter {
    fn format(&self, value: &str, context: FormatContext<'_>) -> Result<String, FormatError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_at == Some(call) {
            return Err(FormatError::UnbalancedBraces { position: 0 });
        }
        self.inner.format(value, context)
    }
}

/// Result of one atomicity check.
#[derive(Debug, Clone)]
pub struct AtomicityResult {
    /// Check description.
    pub description: String,
    /// Whether the check passed.
    pub passed: bool,
    /// What went wrong, if anything.
    pub error: Option<String>,
}

impl AtomicityResult {
    fn pass(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            passed: true,
            error: None,
        }
    }

    fn fail(description: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            passed: false,
            error: Some(error.into()),
        }
    }
}

/// Test harness for aborted and successful saves over an existing file.
pub struct AtomicityHarness {
    /// Destination seeded with [`AtomicityHarness::original`].
    pub dest: TestDestination,
    /// Contents the destination starts with.
    pub original: String,
    /// Preferences used for every save.
    pub prefs: SavePreferences,
    /// Results of checks run so far.
    pub results: Vec<AtomicityResult>,
}

impl AtomicityHarness {
    /// Creates a harness whose destination holds `original`.
    pub fn new(original: &str) -> Self {
        Self {
            dest: TestDestination::with_contents(original),
            original: original.to_string(),
            prefs: SavePreferences::default(),
            results: Vec::new(),
        }
    }

    /// Counts the formatter calls a full save of `ctx` makes.
    pub fn formatter_calls(&self, ctx: &DatabaseContext) -> usize {
        let writer = DatabaseWriter::with_formatter(FailingFormatter::counting());
        let mut sink = MemorySink::new();
        let _ = writer.write_to(ctx, Selection::all(), &self.prefs, &mut sink);
        writer.formatter().calls()
    }

    /// Saves `ctx` with a formatter failing on call `fail_at`.
    ///
    /// The save must fail, the destination must keep its original bytes, and
    /// no backup or temporary file may be left behind.
    pub fn check_failure_at(&mut self, ctx: &DatabaseContext, fail_at: usize) -> AtomicityResult {
        let description = format!("format failure on call {fail_at}");
        let writer = DatabaseWriter::with_formatter(FailingFormatter::new(fail_at));

        let result = match writer.save_to(ctx, &self.prefs, &self.dest.path) {
            Ok(_) => AtomicityResult::fail(description, "save unexpectedly succeeded"),
            Err(_) if self.dest.read() != self.original => {
                AtomicityResult::fail(description, "destination changed")
            }
            Err(_) if self.dest.backup_path().exists() => {
                AtomicityResult::fail(description, "backup written for aborted save")
            }
            Err(_) if !self.dest.leftovers().is_empty() => AtomicityResult::fail(
                description,
                format!("leftover files: {:?}", self.dest.leftovers()),
            ),
            Err(_) => AtomicityResult::pass(description),
        };

        self.results.push(result.clone());
        result
    }

    /// Saves `ctx` normally and checks the destination, backup and directory.
    pub fn check_success(&mut self, ctx: &DatabaseContext) -> AtomicityResult {
        let description = "successful save replaces destination".to_string();
        let expected = render(ctx, &self.prefs);

        let result = match DatabaseWriter::new().save_to(ctx, &self.prefs, &self.dest.path) {
            Err(e) => AtomicityResult::fail(description, e.to_string()),
            Ok(_) if self.dest.read() != expected => {
                AtomicityResult::fail(description, "destination does not match rendering")
            }
            Ok(receipt) if self.prefs.make_backup && receipt.backup.is_none() => {
                AtomicityResult::fail(description, "no backup made")
            }
            Ok(_) if !self.dest.leftovers().is_empty() => AtomicityResult::fail(
                description,
                format!("leftover files: {:?}", self.dest.leftovers()),
            ),
            Ok(_) => AtomicityResult::pass(description),
        };

        self.results.push(result.clone());
        result
    }

    /// Fails the save at every formatter call, then saves successfully.
    pub fn run_all(&mut self, ctx: &DatabaseContext) -> Vec<AtomicityResult> {
        self.results.clear();
        for fail_at in 1..=self.formatter_calls(ctx) {
            self.check_failure_at(ctx, fail_at);
        }
        self.check_success(ctx);
        self.results.clone()
    }

    /// Returns a summary of results.
    pub fn summary(&self) -> String {
        let passed = self.results.iter().filter(|r| r.passed).count();
        let mut summary = format!(
            "\n=== Save Atomicity Summary ===\nPassed: {}/{}\n\n",
            passed,
            self.results.len()
        );
        for result in &self.results {
            let status = if result.passed { "ok  " } else { "FAIL" };
            summary.push_str(&format!("{} {}\n", status, result.description));
            if let Some(ref error) = result.error {
                summary.push_str(&format!("     {}\n", error));
            }
        }
        summary
    }

    /// Returns whether all checks passed.
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::scenarios;

    #[test]
    fn failing_formatter_fails_once() {
        let formatter = FailingFormatter::new(2);
        assert!(formatter.format("a", FormatContext::StringMacro).is_ok());
        assert!(formatter.format("b", FormatContext::StringMacro).is_err());
        assert!(formatter.format("c", FormatContext::StringMacro).is_ok());
        assert_eq!(formatter.calls(), 3);
    }

    #[test]
    fn sample_formats_every_value() {
        let harness = AtomicityHarness::new("old");
        // one string plus three record fields
        assert_eq!(harness.formatter_calls(&scenarios::sample()), 4);
    }

    #[test]
    fn all_atomicity_checks() {
        let mut harness = AtomicityHarness::new("% previous contents\n");
        let results = harness.run_all(&scenarios::sample());
        println!("{}", harness.summary());

        assert_eq!(results.len(), 5);
        assert!(harness.all_passed(), "Some atomicity checks failed");
        assert_eq!(
            std::fs::read_to_string(harness.dest.backup_path()).unwrap(),
            "% previous contents\n"
        );
    }
}

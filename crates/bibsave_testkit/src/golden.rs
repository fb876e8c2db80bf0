//! Golden file helpers for exact output checks.
//!
//! Output is compared against files under `docs/golden` in the workspace.
//! Set `UPDATE_GOLDEN=1` to rewrite the files from the current output.

use std::fs;
use std::path::{Path, PathBuf};

/// A golden test that compares output against expected files.
pub struct GoldenTest {
    name: String,
    golden_dir: PathBuf,
    update_mode: bool,
}

impl GoldenTest {
    /// Creates a new golden test.
    ///
    /// # Arguments
    ///
    /// * `name` - Name of the test (used for file naming)
    /// * `golden_dir` - Directory containing golden files
    pub fn new(name: impl Into<String>, golden_dir: impl AsRef<Path>) -> Self {
        Self {
            name: name.into(),
            golden_dir: golden_dir.as_ref().to_path_buf(),
            update_mode: std::env::var("UPDATE_GOLDEN").is_ok(),
        }
    }

    /// Creates a golden test using `docs/golden` in the workspace root.
    pub fn with_default_dir(name: impl Into<String>) -> Self {
        let golden_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .and_then(|p| p.parent())
            .map(|p| p.join("docs").join("golden"))
            .unwrap_or_else(|| PathBuf::from("golden"));

        Self::new(name, golden_dir)
    }

    /// Asserts that `actual` matches the golden `.bib` file.
    ///
    /// If `UPDATE_GOLDEN` environment variable is set, updates the golden file instead.
    pub fn assert_text(&self, suffix: &str, actual: &str) {
        let path = self.file_path(suffix);

        if self.update_mode {
            self.update_golden_file(&path, actual.as_bytes());
            return;
        }

        if !path.exists() {
            panic!(
                "Golden file not found: {:?}\n\
                 Run with UPDATE_GOLDEN=1 to create it.\n\
                 Actual:\n{}",
                path, actual
            );
        }

        let expected = fs::read_to_string(&path).expect("Failed to read golden file");

        if let Some((line, want, got)) = first_difference(&expected, actual) {
            panic!(
                "Golden test '{}' failed for '{}' at line {}:\n\
                 expected: {:?}\n\
                 actual:   {:?}\n\
                 --- Actual ---\n{}\n\
                 Run with UPDATE_GOLDEN=1 to update.",
                self.name, suffix, line, want, got, actual
            );
        }
    }

    /// Asserts that encoded output matches the golden file byte for byte.
    ///
    /// Used for encodings other than UTF-8.
    pub fn assert_bytes(&self, suffix: &str, actual: &[u8]) {
        let path = self.file_path(suffix);

        if self.update_mode {
            self.update_golden_file(&path, actual);
            return;
        }

        let expected = fs::read(&path).unwrap_or_else(|e| {
            panic!("Golden file {:?} unreadable ({e}). Run with UPDATE_GOLDEN=1 to create it.", path)
        });

        if let Some(offset) = expected.iter().zip(actual).position(|(a, b)| a != b) {
            panic!(
                "Golden test '{}' failed for '{}': first difference at byte {} \
                 (expected {:#04x}, actual {:#04x})",
                self.name, suffix, offset, expected[offset], actual[offset]
            );
        }
        assert_eq!(
            expected.len(),
            actual.len(),
            "Golden test '{}' failed for '{}': length differs",
            self.name,
            suffix
        );
    }

    fn file_path(&self, suffix: &str) -> PathBuf {
        let filename = if suffix.is_empty() {
            format!("{}.bib", self.name)
        } else {
            format!("{}_{}.bib", self.name, suffix)
        };
        self.golden_dir.join(filename)
    }

    fn update_golden_file(&self, path: &Path, data: &[u8]) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create golden directory");
        }
        fs::write(path, data).expect("Failed to write golden file");
        println!("Updated golden file: {:?}", path);
    }
}

/// First differing line as `(line number, expected, actual)`, 1-based.
///
/// A missing line is reported as an empty string.
pub fn first_difference<'a>(expected: &'a str, actual: &'a str) -> Option<(usize, &'a str, &'a str)> {
    if expected == actual {
        return None;
    }
    let mut want = expected.split('\n');
    let mut got = actual.split('\n');
    let mut line = 1;
    loop {
        match (want.next(), got.next()) {
            (Some(a), Some(b)) if a == b => line += 1,
            (a, b) => return Some((line, a.unwrap_or(""), b.unwrap_or(""))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn first_difference_reports_line() {
        assert_eq!(first_difference("a\nb\n", "a\nb\n"), None);
        assert_eq!(first_difference("a\nb\n", "a\nc\n"), Some((2, "b", "c")));
        assert_eq!(first_difference("a\n", "a\nextra"), Some((2, "", "extra")));
    }

    #[test]
    fn matching_text_passes() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("case_utf8.bib"), "@Misc{m\n}\n").unwrap();
        let golden = GoldenTest::new("case", dir.path());
        if !golden.update_mode {
            golden.assert_text("utf8", "@Misc{m\n}\n");
            golden.assert_bytes("utf8", b"@Misc{m\n}\n");
        }
    }

    #[test]
    #[should_panic(expected = "at line 2")]
    fn mismatch_panics() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("case.bib"), "a\nb\n").unwrap();
        let golden = GoldenTest {
            name: "case".into(),
            golden_dir: dir.path().to_path_buf(),
            update_mode: false,
        };
        golden.assert_text("", "a\nc\n");
    }
}

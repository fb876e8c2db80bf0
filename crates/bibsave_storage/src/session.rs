//! Atomic save sessions.
//!
//! A [`SaveSession`] owns one temporary file for its whole lifetime. Writers
//! fill it through [`SaveSession::writer`]; nothing touches the destination
//! until [`SaveSession::commit`] is called:
//!
//! ```text
//! open ──write──▶ open ──commit──▶ committed
//!                  │
//!                  └──cancel / drop──▶ cancelled (temp file removed)
//! ```
//!
//! Commit uses the write-then-rename pattern: the finished output is copied
//! into a staging file next to the destination, synced, renamed over the
//! destination, and the directory is synced.

use crate::encoding::Encoding;
use crate::error::{StorageError, StorageResult};
use crate::file::{hex_encode, VerifyingWriter};
use crate::sink::TextSink;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Suffix appended to the destination for the backup copy.
pub const BACKUP_SUFFIX: &str = ".bak";
/// Suffix appended to the destination for the advisory lock file.
pub const LOCK_SUFFIX: &str = ".lock";

/// State of a save session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Output can still be written.
    Open,
    /// Output replaced the destination.
    Committed,
    /// Output was discarded.
    Cancelled,
}

impl SessionState {
    const fn name(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Committed => "committed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Summary of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    /// The destination that was replaced.
    pub path: PathBuf,
    /// Backup copy of the previous destination, if one was made.
    pub backup: Option<PathBuf>,
    /// Number of encoded bytes written.
    pub bytes_written: u64,
    /// SHA-256 digest of the written bytes (hex).
    pub digest: String,
    /// Characters that could not be encoded and were replaced by `?`.
    pub problem_characters: String,
}

/// An all-or-nothing write to one destination file.
///
/// # Example
///
/// ```no_run
/// use bibsave_storage::{Encoding, SaveSession, TextSink};
/// use std::path::Path;
///
/// let mut session = SaveSession::open(Encoding::Utf8, true).unwrap();
/// session.writer().unwrap().write_str("@Preamble{x}\n").unwrap();
/// let receipt = session.commit(Path::new("refs.bib")).unwrap();
/// println!("wrote {} bytes", receipt.bytes_written);
/// ```
#[derive(Debug)]
pub struct SaveSession {
    encoding: Encoding,
    make_backup: bool,
    state: SessionState,
    temp: Option<NamedTempFile>,
    writer: Option<VerifyingWriter>,
}

impl SaveSession {
    /// Opens a session backed by a fresh temporary file.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary file cannot be created.
    pub fn open(encoding: Encoding, make_backup: bool) -> StorageResult<Self> {
        Self::open_in(&std::env::temp_dir(), encoding, make_backup)
    }

    /// Opens a session whose temporary file lives in `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary file cannot be created.
    pub fn open_in(dir: &Path, encoding: Encoding, make_backup: bool) -> StorageResult<Self> {
        let temp = tempfile::Builder::new()
            .prefix("bibsave-")
            .suffix(".tmp")
            .tempfile_in(dir)?;
        let file = temp.reopen()?;
        debug!(path = ?temp.path(), %encoding, "opened save session");

        Ok(Self {
            encoding,
            make_backup,
            state: SessionState::Open,
            temp: Some(temp),
            writer: Some(VerifyingWriter::new(file, encoding)),
        })
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns the output encoding.
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Returns the path of the temporary output while the session is open.
    #[must_use]
    pub fn temp_path(&self) -> Option<&Path> {
        self.temp.as_ref().map(NamedTempFile::path)
    }

    /// Returns the writer for the temporary output.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::SessionClosed`] once the session is terminal.
    pub fn writer(&mut self) -> StorageResult<&mut VerifyingWriter> {
        let state = self.state;
        match self.writer.as_mut() {
            Some(writer) if state == SessionState::Open => Ok(writer),
            _ => Err(StorageError::SessionClosed { state: state.name() }),
        }
    }

    /// Returns true if every written character was representable.
    #[must_use]
    pub fn could_encode_all(&self) -> bool {
        self.writer.as_ref().map_or(true, VerifyingWriter::could_encode_all)
    }

    /// Returns the characters that were replaced during encoding.
    #[must_use]
    pub fn problem_characters(&self) -> String {
        self.writer
            .as_ref()
            .map(VerifyingWriter::problem_characters)
            .unwrap_or_default()
    }

    /// Reads back everything written so far without committing.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is terminal or the read fails.
    pub fn read_output(&mut self) -> StorageResult<Vec<u8>> {
        self.writer()?.flush()?;
        let temp = self.temp.as_ref().ok_or(StorageError::SessionClosed {
            state: self.state.name(),
        })?;

        let mut data = Vec::new();
        temp.reopen()?.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Atomically replaces `destination` with the session output.
    ///
    /// Steps:
    /// 1. Flush and sync the temporary output
    /// 2. Take an exclusive lock on `<destination>.lock`
    /// 3. Copy the previous destination to `<destination>.bak` if backups are on
    /// 4. Stage the output next to the destination and rename it into place
    /// 5. Fsync the directory so the rename is durable
    ///
    /// If any step fails the session stays open and the destination is
    /// unchanged, so the caller may retry or cancel.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is terminal, the destination is locked,
    /// or any I/O step fails.
    pub fn commit(&mut self, destination: &Path) -> StorageResult<CommitReceipt> {
        let writer = self.writer()?;
        writer.sync()?;
        let bytes_written = writer.bytes_written();
        let digest = hex_encode(&writer.digest());
        let problem_characters = writer.problem_characters();

        if !problem_characters.is_empty() {
            warn!(
                chars = %problem_characters,
                encoding = %self.encoding,
                "characters not representable in encoding were replaced"
            );
        }

        let parent = match destination.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let lock = acquire_lock(destination)?;
        let result = self.replace(destination, &parent);
        release_lock(lock);
        let backup = result?;

        self.state = SessionState::Committed;
        self.writer = None;
        self.temp = None;

        info!(path = ?destination, bytes = bytes_written, "committed save session");

        Ok(CommitReceipt {
            path: destination.to_path_buf(),
            backup,
            bytes_written,
            digest,
            problem_characters,
        })
    }

    fn replace(&self, destination: &Path, parent: &Path) -> StorageResult<Option<PathBuf>> {
        let temp = self.temp.as_ref().ok_or(StorageError::SessionClosed {
            state: self.state.name(),
        })?;

        let backup = if self.make_backup && destination.exists() {
            let backup_path = with_suffix(destination, BACKUP_SUFFIX);
            fs::copy(destination, &backup_path)?;
            Some(backup_path)
        } else {
            None
        };

        let mut staging = NamedTempFile::new_in(parent)?;
        io::copy(&mut temp.reopen()?, staging.as_file_mut())?;
        staging.as_file().sync_all()?;
        staging
            .persist(destination)
            .map_err(|e| StorageError::Persist {
                message: e.error.to_string(),
            })?;

        sync_directory(parent)?;
        Ok(backup)
    }

    /// Discards the output. The destination is never touched.
    ///
    /// Cancelling a cancelled session is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::SessionClosed`] if the session was committed.
    pub fn cancel(&mut self) -> StorageResult<()> {
        match self.state {
            SessionState::Committed => Err(StorageError::SessionClosed {
                state: self.state.name(),
            }),
            SessionState::Cancelled => Ok(()),
            SessionState::Open => {
                self.state = SessionState::Cancelled;
                self.writer = None;
                if let Some(temp) = self.temp.take() {
                    debug!(path = ?temp.path(), "cancelled save session");
                    temp.close()?;
                }
                Ok(())
            }
        }
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn acquire_lock(destination: &Path) -> StorageResult<File> {
    let lock_path = with_suffix(destination, LOCK_SUFFIX);
    let lock_file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)?;

    if lock_file.try_lock_exclusive().is_err() {
        return Err(StorageError::Locked { path: lock_path });
    }
    Ok(lock_file)
}

/// Unlocks without removing the file, so every committer locks the same inode.
fn release_lock(lock_file: File) {
    let _ = lock_file.unlock();
}

#[cfg(unix)]
fn sync_directory(dir: &Path) -> StorageResult<()> {
    File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_directory(_dir: &Path) -> StorageResult<()> {
    // NTFS journals metadata updates; directories cannot be fsynced
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(session: &mut SaveSession, text: &str) {
        session.writer().unwrap().write_str(text).unwrap();
    }

    #[test]
    fn commit_replaces_destination() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("refs.bib");
        fs::write(&dest, "old").unwrap();

        let mut session = SaveSession::open_in(dir.path(), Encoding::Utf8, false).unwrap();
        write(&mut session, "new contents");
        let receipt = session.commit(&dest).unwrap();

        assert_eq!(fs::read_to_string(&dest).unwrap(), "new contents");
        assert_eq!(receipt.bytes_written, 12);
        assert!(receipt.backup.is_none());
        assert_eq!(session.state(), SessionState::Committed);
    }

    #[test]
    fn lock_file_is_kept_and_released() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("refs.bib");

        let mut first = SaveSession::open_in(dir.path(), Encoding::Utf8, false).unwrap();
        write(&mut first, "one");
        first.commit(&dest).unwrap();
        let lock_path = with_suffix(&dest, LOCK_SUFFIX);
        assert!(lock_path.exists());

        // Released: a new handle on the same file can lock it
        let handle = OpenOptions::new().write(true).open(&lock_path).unwrap();
        handle.try_lock_exclusive().unwrap();
        handle.unlock().unwrap();
        drop(handle);

        let mut second = SaveSession::open_in(dir.path(), Encoding::Utf8, false).unwrap();
        write(&mut second, "two");
        second.commit(&dest).unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), "two");
        assert!(lock_path.exists());
    }

    #[test]
    fn destination_untouched_until_commit() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("refs.bib");
        fs::write(&dest, "original").unwrap();

        let mut session = SaveSession::open_in(dir.path(), Encoding::Utf8, false).unwrap();
        write(&mut session, "replacement");

        assert_eq!(fs::read_to_string(&dest).unwrap(), "original");
        assert_eq!(session.read_output().unwrap(), b"replacement");
    }

    #[test]
    fn cancel_removes_temp_file() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("refs.bib");
        fs::write(&dest, "original").unwrap();

        let mut session = SaveSession::open_in(dir.path(), Encoding::Utf8, false).unwrap();
        write(&mut session, "partial");
        let temp_path = session.temp_path().unwrap().to_path_buf();
        assert!(temp_path.exists());

        session.cancel().unwrap();
        assert!(!temp_path.exists());
        assert_eq!(session.state(), SessionState::Cancelled);
        assert_eq!(fs::read_to_string(&dest).unwrap(), "original");

        // Terminal state rejects further use
        assert!(matches!(
            session.writer(),
            Err(StorageError::SessionClosed { state: "cancelled" })
        ));
        assert!(session.commit(&dest).is_err());
        assert!(session.cancel().is_ok());
    }

    #[test]
    fn drop_removes_temp_file() {
        let dir = tempdir().unwrap();
        let temp_path = {
            let mut session = SaveSession::open_in(dir.path(), Encoding::Utf8, false).unwrap();
            write(&mut session, "abandoned");
            session.temp_path().unwrap().to_path_buf()
        };
        assert!(!temp_path.exists());
    }

    #[test]
    fn commit_makes_backup() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("refs.bib");
        fs::write(&dest, "version 1").unwrap();

        let mut session = SaveSession::open_in(dir.path(), Encoding::Utf8, true).unwrap();
        write(&mut session, "version 2");
        let receipt = session.commit(&dest).unwrap();

        let backup = receipt.backup.unwrap();
        assert_eq!(backup, dir.path().join("refs.bib.bak"));
        assert_eq!(fs::read_to_string(&backup).unwrap(), "version 1");
        assert_eq!(fs::read_to_string(&dest).unwrap(), "version 2");
    }

    #[test]
    fn backup_skipped_for_new_destination() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("fresh.bib");

        let mut session = SaveSession::open_in(dir.path(), Encoding::Utf8, true).unwrap();
        write(&mut session, "first save");
        let receipt = session.commit(&dest).unwrap();

        assert!(receipt.backup.is_none());
        assert_eq!(fs::read_to_string(&dest).unwrap(), "first save");
    }

    #[test]
    fn commit_fails_when_locked() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("refs.bib");
        fs::write(&dest, "original").unwrap();

        let held = acquire_lock(&dest).unwrap();

        let mut session = SaveSession::open_in(dir.path(), Encoding::Utf8, false).unwrap();
        write(&mut session, "blocked");
        let result = session.commit(&dest);
        assert!(matches!(result, Err(StorageError::Locked { .. })));
        assert_eq!(session.state(), SessionState::Open);
        assert_eq!(fs::read_to_string(&dest).unwrap(), "original");

        release_lock(held);
        session.commit(&dest).unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), "blocked");
    }

    #[test]
    fn receipt_reports_problem_characters() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("ascii.bib");

        let mut session = SaveSession::open_in(dir.path(), Encoding::UsAscii, false).unwrap();
        write(&mut session, "Schrödinger");
        assert!(!session.could_encode_all());
        let receipt = session.commit(&dest).unwrap();

        assert_eq!(receipt.problem_characters, "ö");
        assert_eq!(fs::read(&dest).unwrap(), b"Schr?dinger");
    }
}

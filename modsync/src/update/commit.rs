//! Atomic per-source commit.
//!
//! A source transitions to committed only if every one of its planned
//! entries staged successfully in that attempt. Anything less rolls the
//! whole attempt back: even successfully staged files are discarded, so
//! there is no state where some but not all of a source's files were
//! replaced. The replacement itself is two-phase: every destination is
//! backed up before it is overwritten, and a write failure restores the
//! backups, so a failure midway through the loop cannot leave a strict
//! subset of destinations updated. Staging cleanup is always attempted and
//! never escalates; a cleanup failure must not mask the commit verdict.

use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::store;
use crate::update::plan::StagingResult;

/// Verdict of one commit attempt for one source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Every planned file was replaced.
    Committed {
        /// Number of destination files replaced.
        files: usize,
    },
    /// Nothing was committed; the source must be re-attempted as a whole.
    Failed {
        /// Names of the files that caused the failure.
        failing_files: Vec<String>,
    },
}

impl CommitOutcome {
    /// Whether the commit went through.
    pub fn is_committed(&self) -> bool {
        matches!(self, CommitOutcome::Committed { .. })
    }
}

/// A destination that has been overwritten and can still be undone.
///
/// `backup` holds the pre-commit contents, or `None` when no file existed
/// at the destination before this attempt.
struct ReplacedFile {
    destination: PathBuf,
    file_name: String,
    backup: Option<PathBuf>,
}

/// Commits a source's staged downloads, or rolls them back.
#[derive(Debug, Default)]
pub struct CommitManager;

impl CommitManager {
    /// Create a commit manager.
    pub fn new() -> Self {
        Self
    }

    /// Commit one source's staging result.
    ///
    /// With a complete staging result, replaces every destination file from
    /// its staged copy and deletes the staging directory. With any failure
    /// present, discards the whole staging directory without committing
    /// anything. A write failure during the replacement restores every
    /// destination already overwritten, so the source's install directory
    /// holds either the old file set or the new one, never a mix. The
    /// staging result is consumed either way; it does not outlive the
    /// attempt.
    pub fn commit(&self, source_name: &str, staging: StagingResult) -> CommitOutcome {
        if !staging.is_complete() {
            warn!(
                source = %source_name,
                failed = staging.failed.len(),
                staged = staging.staged.len(),
                "Discarding staged files, source had download failures"
            );
            let failing_files = staging.failed.clone();
            store::remove_dir_best_effort(&staging.staging_dir);
            return CommitOutcome::Failed { failing_files };
        }

        let outcome = match self.replace_all(source_name, &staging) {
            Ok(files) => {
                info!(source = %source_name, files, "Source committed");
                CommitOutcome::Committed { files }
            }
            Err(failing_file) => CommitOutcome::Failed {
                failing_files: vec![failing_file],
            },
        };

        store::remove_dir_best_effort(&staging.staging_dir);
        outcome
    }

    /// Replace every destination from its staged copy, or none of them.
    ///
    /// Returns the name of the file whose backup or copy failed. Backups
    /// live under the staging directory and disappear with it, whichever way
    /// the attempt ends.
    fn replace_all(&self, source_name: &str, staging: &StagingResult) -> Result<usize, String> {
        let backup_dir = staging.staging_dir.join("rollback");
        let mut replaced: Vec<ReplacedFile> = Vec::with_capacity(staging.staged.len());

        for (index, (entry, staged_path)) in staging.staged.iter().enumerate() {
            let backup = if store::file_exists(&entry.local_path) {
                let backup_path = backup_dir.join(index.to_string());
                if let Err(e) = store::copy_file(&entry.local_path, &backup_path) {
                    warn!(
                        source = %source_name,
                        file = %entry.file_name(),
                        error = %e,
                        "Commit backup failed, abandoning source"
                    );
                    self.restore(source_name, &replaced);
                    return Err(entry.file_name());
                }
                Some(backup_path)
            } else {
                None
            };

            if let Err(e) = store::copy_file(staged_path, &entry.local_path) {
                warn!(
                    source = %source_name,
                    file = %entry.file_name(),
                    error = %e,
                    "Commit write failed, abandoning source"
                );
                // The failing destination may hold a partial write; restoring
                // it together with the earlier ones puts it back too.
                replaced.push(ReplacedFile {
                    destination: entry.local_path.clone(),
                    file_name: entry.file_name(),
                    backup,
                });
                self.restore(source_name, &replaced);
                return Err(entry.file_name());
            }

            replaced.push(ReplacedFile {
                destination: entry.local_path.clone(),
                file_name: entry.file_name(),
                backup,
            });
        }

        Ok(replaced.len())
    }

    /// Put every overwritten destination back to its pre-commit state, in
    /// reverse replacement order.
    fn restore(&self, source_name: &str, replaced: &[ReplacedFile]) {
        for file in replaced.iter().rev() {
            let restored = match &file.backup {
                Some(backup_path) => store::copy_file(backup_path, &file.destination),
                None if store::file_exists(&file.destination) => {
                    store::delete_file(&file.destination)
                }
                None => Ok(()),
            };
            if let Err(e) = restored {
                error!(
                    source = %source_name,
                    file = %file.file_name,
                    error = %e,
                    "Rollback failed, destination left in new state"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use tempfile::TempDir;

    use super::*;
    use crate::source::FileEntry;
    use crate::update::plan::StagingResult;

    fn stage(staging_dir: &Path, dest_dir: &Path, name: &str, contents: &[u8]) -> (FileEntry, std::path::PathBuf) {
        let staged_path = staging_dir.join(name);
        fs::write(&staged_path, contents).unwrap();
        let entry = FileEntry::new(format!("http://x/{name}"), dest_dir.join(name));
        (entry, staged_path)
    }

    #[test]
    fn test_commit_replaces_all_destinations() {
        let staging = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let staging_path = staging.path().join("attempt");
        fs::create_dir_all(&staging_path).unwrap();

        let mut result = StagingResult::new(staging_path.clone());
        let (entry_a, path_a) = stage(&staging_path, dest.path(), "a.dll", b"new a");
        let (entry_b, path_b) = stage(&staging_path, dest.path(), "b.dll", b"new b");
        fs::write(dest.path().join("a.dll"), b"old a").unwrap();
        result.record_staged(entry_a, path_a);
        result.record_staged(entry_b, path_b);

        let outcome = CommitManager::new().commit("Foo", result);

        assert_eq!(outcome, CommitOutcome::Committed { files: 2 });
        assert_eq!(fs::read(dest.path().join("a.dll")).unwrap(), b"new a");
        assert_eq!(fs::read(dest.path().join("b.dll")).unwrap(), b"new b");
        // Staging directory is gone after commit.
        assert!(!staging_path.exists());
    }

    #[test]
    fn test_partial_staging_commits_nothing() {
        let staging = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let staging_path = staging.path().join("attempt");
        fs::create_dir_all(&staging_path).unwrap();

        let mut result = StagingResult::new(staging_path.clone());
        let (entry_a, path_a) = stage(&staging_path, dest.path(), "a.dll", b"new a");
        result.record_staged(entry_a, path_a);
        result.record_failure("b.dll".to_string());
        fs::write(dest.path().join("a.dll"), b"old a").unwrap();

        let outcome = CommitManager::new().commit("Bar", result);

        assert_eq!(
            outcome,
            CommitOutcome::Failed {
                failing_files: vec!["b.dll".to_string()]
            }
        );
        // The successfully staged file was discarded, not committed.
        assert_eq!(fs::read(dest.path().join("a.dll")).unwrap(), b"old a");
        assert!(!staging_path.exists());
    }

    #[test]
    fn test_commit_write_failure_marks_source_failed() {
        let staging = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let staging_path = staging.path().join("attempt");
        fs::create_dir_all(&staging_path).unwrap();

        let mut result = StagingResult::new(staging_path.clone());
        let (entry_a, path_a) = stage(&staging_path, dest.path(), "a.dll", b"new a");
        result.record_staged(entry_a, path_a);

        // Destination path is a directory, so the copy fails.
        let blocked = dest.path().join("b.dll");
        fs::create_dir_all(&blocked).unwrap();
        let staged_b = staging_path.join("b.dll");
        fs::write(&staged_b, b"new b").unwrap();
        result.record_staged(FileEntry::new("http://x/b.dll", &blocked), staged_b);

        let outcome = CommitManager::new().commit("Baz", result);

        match outcome {
            CommitOutcome::Failed { failing_files } => {
                assert!(failing_files.contains(&"b.dll".to_string()));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(!staging_path.exists());
    }

    #[test]
    fn test_commit_write_failure_restores_earlier_destinations() {
        let staging = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let staging_path = staging.path().join("attempt");
        fs::create_dir_all(&staging_path).unwrap();

        let mut result = StagingResult::new(staging_path.clone());
        let (entry_a, path_a) = stage(&staging_path, dest.path(), "a.dll", b"new a");
        fs::write(dest.path().join("a.dll"), b"old a").unwrap();
        result.record_staged(entry_a, path_a);

        // a.dll is replaced first; b.dll's blocked destination then fails
        // the copy, which must undo a.dll's replacement.
        let blocked = dest.path().join("b.dll");
        fs::create_dir_all(&blocked).unwrap();
        let staged_b = staging_path.join("b.dll");
        fs::write(&staged_b, b"new b").unwrap();
        result.record_staged(FileEntry::new("http://x/b.dll", &blocked), staged_b);

        let outcome = CommitManager::new().commit("Baz", result);

        assert!(!outcome.is_committed());
        assert_eq!(fs::read(dest.path().join("a.dll")).unwrap(), b"old a");
        assert!(!staging_path.exists());
    }

    #[test]
    fn test_rollback_deletes_destinations_that_were_new() {
        let staging = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let staging_path = staging.path().join("attempt");
        fs::create_dir_all(&staging_path).unwrap();

        // a.dll has no pre-existing destination file.
        let mut result = StagingResult::new(staging_path.clone());
        let (entry_a, path_a) = stage(&staging_path, dest.path(), "a.dll", b"new a");
        result.record_staged(entry_a, path_a);

        let blocked = dest.path().join("b.dll");
        fs::create_dir_all(&blocked).unwrap();
        let staged_b = staging_path.join("b.dll");
        fs::write(&staged_b, b"new b").unwrap();
        result.record_staged(FileEntry::new("http://x/b.dll", &blocked), staged_b);

        let outcome = CommitManager::new().commit("Baz", result);

        assert!(!outcome.is_committed());
        assert!(!dest.path().join("a.dll").exists());
    }
}

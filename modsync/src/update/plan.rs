//! Session state types: the update plan, staging results, and the outcome.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::source::FileEntry;

/// One source's share of the update plan: its display name and the entries
/// found stale for it, in the source's own order.
#[derive(Clone, Debug)]
pub struct PlannedSource {
    /// Display identity of the source.
    pub name: String,
    /// Stale entries to replace. A commit replaces all of them or none.
    pub entries: Vec<FileEntry>,
}

impl PlannedSource {
    /// Create a planned source.
    pub fn new(name: impl Into<String>, entries: Vec<FileEntry>) -> Self {
        Self {
            name: name.into(),
            entries,
        }
    }
}

/// The work a session agreed to do, built once during the checking phase.
///
/// Sources with no stale entries are omitted. The plan is never mutated
/// after construction except by removal when a source commits.
#[derive(Clone, Debug, Default)]
pub struct UpdatePlan {
    sources: Vec<PlannedSource>,
}

impl UpdatePlan {
    /// Create an empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source with its stale entries. Sources with nothing stale
    /// should not be added.
    pub fn add_source(&mut self, source: PlannedSource) {
        debug_assert!(!source.entries.is_empty());
        self.sources.push(source);
    }

    /// Whether the plan has no work.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Number of sources with pending updates.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Total number of stale files across all sources.
    pub fn file_count(&self) -> usize {
        self.sources.iter().map(|s| s.entries.len()).sum()
    }

    /// The planned sources, in plan order.
    pub fn sources(&self) -> &[PlannedSource] {
        &self.sources
    }

    /// Display names of the planned sources, in plan order.
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name.as_str()).collect()
    }

    /// Look up a planned source by name. Retry re-attempts a failed source's
    /// original planned file list, which this provides.
    pub fn get(&self, name: &str) -> Option<&PlannedSource> {
        self.sources.iter().find(|s| s.name == name)
    }
}

/// Result of staging one source's downloads, for one commit attempt.
///
/// Covers every requested entry exactly once: each entry lands either in
/// `staged` or in `failed`, never both. Discarded after commit or rollback.
#[derive(Debug)]
pub struct StagingResult {
    /// The private per-source, per-attempt staging directory.
    pub staging_dir: PathBuf,
    /// Successfully downloaded entries and their temporary paths.
    pub staged: Vec<(FileEntry, PathBuf)>,
    /// File names of entries that failed to download.
    pub failed: Vec<String>,
}

impl StagingResult {
    /// Create an empty staging result for the given staging directory.
    pub fn new(staging_dir: PathBuf) -> Self {
        Self {
            staging_dir,
            staged: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// Record a successful download.
    pub fn record_staged(&mut self, entry: FileEntry, temp_path: PathBuf) {
        self.staged.push((entry, temp_path));
    }

    /// Record a failed download by destination file name.
    pub fn record_failure(&mut self, file_name: String) {
        self.failed.push(file_name);
    }

    /// Whether every entry staged successfully.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of entries covered, staged and failed together.
    pub fn entry_count(&self) -> usize {
        self.staged.len() + self.failed.len()
    }
}

/// Aggregate result of one update session.
///
/// Owned by the orchestrator invocation and passed through the call chain;
/// nothing about a session survives in process-wide state.
#[derive(Clone, Debug, Default)]
pub struct SessionOutcome {
    /// Total files committed across all sources and attempts.
    pub files_committed: usize,
    /// Sources that still fail, with the file names that remain failing.
    /// Keyed by display name; ordered for stable reports.
    pub failed_sources: BTreeMap<String, Vec<String>>,
}

impl SessionOutcome {
    /// Create an empty outcome.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful commit of `files` files for a source, clearing
    /// any failure recorded for it by an earlier attempt.
    pub fn record_commit(&mut self, source_name: &str, files: usize) {
        self.files_committed += files;
        self.failed_sources.remove(source_name);
    }

    /// Record a failed source with its failing file names, replacing any
    /// earlier record for the same source.
    pub fn record_failure(&mut self, source_name: &str, failing_files: Vec<String>) {
        self.failed_sources
            .insert(source_name.to_string(), failing_files);
    }

    /// Whether any source is still failing.
    pub fn has_failures(&self) -> bool {
        !self.failed_sources.is_empty()
    }

    /// Whether the session changed any file on disk.
    pub fn committed_anything(&self) -> bool {
        self.files_committed > 0
    }
}

//! Updatable sources and their file mappings.
//!
//! A source is one independently-updatable unit (a plugin) exposing a stable
//! display identity and an ordered set of `remote URL → local path` entries.
//! Sources are owned by the host; the orchestrator only reads them for the
//! duration of a session.

use std::path::PathBuf;
use std::sync::Arc;

/// One `(remote URL, local path)` pair belonging to exactly one source.
///
/// Immutable for the life of a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileEntry {
    /// URL the artifact is downloaded from.
    pub remote_url: String,
    /// Path the artifact is installed to.
    pub local_path: PathBuf,
}

impl FileEntry {
    /// Create a new file entry.
    pub fn new(remote_url: impl Into<String>, local_path: impl Into<PathBuf>) -> Self {
        Self {
            remote_url: remote_url.into(),
            local_path: local_path.into(),
        }
    }

    /// Base name of the destination file, used for staging and reporting.
    pub fn file_name(&self) -> String {
        self.local_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.remote_url.clone())
    }

    /// URL of the artifact's published digest.
    ///
    /// The publisher is expected to serve the artifact's MD5 digest, base64
    /// encoded, as a text sidecar next to the artifact itself.
    pub fn hash_url(&self) -> String {
        format!("{}.md5", self.remote_url)
    }
}

/// Capability exposed by anything the orchestrator can update.
///
/// Hosts implement this on their plugin handles and register the
/// implementations with the orchestrator at construction.
pub trait Updatable: Send + Sync {
    /// Stable display identity, used in prompts and reports.
    fn display_name(&self) -> &str;

    /// The files this source wants kept up to date, in a stable order.
    fn updatable_files(&self) -> Vec<FileEntry>;
}

/// A source described directly by name and file list.
///
/// The simplest `Updatable` implementation; manifest loaders and tests build
/// their sources from this.
#[derive(Clone, Debug)]
pub struct StaticSource {
    name: String,
    files: Vec<FileEntry>,
}

impl StaticSource {
    /// Create a source from a display name and its file entries.
    pub fn new(name: impl Into<String>, files: Vec<FileEntry>) -> Self {
        Self {
            name: name.into(),
            files,
        }
    }

    /// Convenience wrapper producing the trait-object form the orchestrator
    /// consumes.
    pub fn into_updatable(self) -> Arc<dyn Updatable> {
        Arc::new(self)
    }
}

impl Updatable for StaticSource {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn updatable_files(&self) -> Vec<FileEntry> {
        self.files.clone()
    }
}

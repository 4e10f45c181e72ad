//! Bounded-concurrency downloader for one source's file batch.
//!
//! Fans out up to `concurrency` fetches at a time over a source's stale
//! entries, writing each into the source's private staging directory under
//! the destination's base name. Failures are collected, not thrown: one
//! entry's failure never cancels sibling downloads already in flight, and
//! the returned `StagingResult` covers every requested entry exactly once.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;

use tracing::{debug, warn};

use crate::error::{UpdaterError, UpdaterResult};
use crate::host::ProgressObserver;
use crate::source::FileEntry;
use crate::store;
use crate::transport::HttpClient;
use crate::update::plan::StagingResult;

/// Downloads a batch of entries into a staging directory.
pub struct Downloader {
    http: Arc<dyn HttpClient>,
    concurrency: usize,
}

impl Downloader {
    /// Create a downloader with the given transport and concurrency cap
    /// (minimum 1).
    pub fn new(http: Arc<dyn HttpClient>, concurrency: usize) -> Self {
        Self {
            http,
            concurrency: concurrency.max(1),
        }
    }

    /// The concurrency cap in effect.
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Download every entry into `staging_dir`.
    ///
    /// Processes entries in batches of at most `concurrency` threads,
    /// joining each batch before starting the next, so no commit decision
    /// can observe partial interim state. Always returns a complete
    /// `StagingResult`; network and write failures land in its failed list.
    pub fn download_all(
        &self,
        source_name: &str,
        entries: &[FileEntry],
        staging_dir: &Path,
        observer: Option<&ProgressObserver>,
    ) -> StagingResult {
        let result = Arc::new(Mutex::new(StagingResult::new(staging_dir.to_path_buf())));

        for batch in entries.chunks(self.concurrency) {
            let mut handles = Vec::with_capacity(batch.len());

            for entry in batch {
                let entry = entry.clone();
                let staging_path = staging_dir.join(entry.file_name());
                let http = Arc::clone(&self.http);
                let result = Arc::clone(&result);
                let source_name = source_name.to_string();
                let observer = observer.cloned();

                handles.push(thread::spawn(move || {
                    if let Some(ref observe) = observer {
                        observe(&source_name, &entry.file_name());
                    }

                    match fetch_one(http.as_ref(), &entry, &staging_path) {
                        Ok(()) => {
                            debug!(source = %source_name, file = %entry.file_name(), "Staged");
                            result.lock().unwrap().record_staged(entry, staging_path);
                        }
                        Err(reason) => {
                            warn!(
                                source = %source_name,
                                file = %entry.file_name(),
                                reason = %reason,
                                "Download failed"
                            );
                            result.lock().unwrap().record_failure(entry.file_name());
                        }
                    }
                }));
            }

            for handle in handles {
                if handle.join().is_err() {
                    // A panicking download thread is counted against the
                    // source by the entry-coverage check below.
                    warn!(source = %source_name, "Download worker panicked");
                }
            }
        }

        let mut result = Arc::into_inner(result)
            .map(|m| m.into_inner().unwrap_or_else(|p| p.into_inner()))
            .unwrap_or_else(|| StagingResult::new(staging_dir.to_path_buf()));

        // Every entry must be accounted for, success or failure. A worker
        // that died before recording shows up here as a missing entry.
        if result.entry_count() < entries.len() {
            let covered: Vec<String> = result
                .staged
                .iter()
                .map(|(e, _)| e.file_name())
                .chain(result.failed.iter().cloned())
                .collect();
            for entry in entries {
                let name = entry.file_name();
                if !covered.contains(&name) {
                    result.record_failure(name);
                }
            }
        }

        result
    }
}

/// Fetch one entry into its staging path.
///
/// A non-success response or an empty body is a failure; no zero-byte file
/// is written that could masquerade as a successful update.
fn fetch_one(
    http: &dyn HttpClient,
    entry: &FileEntry,
    staging_path: &Path,
) -> UpdaterResult<()> {
    let bytes = http.get_bytes(&entry.remote_url)?;

    if bytes.is_empty() {
        return Err(UpdaterError::EmptyBody {
            url: entry.remote_url.clone(),
        });
    }

    store::write_bytes(staging_path, &bytes)
}

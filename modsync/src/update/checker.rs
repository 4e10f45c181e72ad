//! Hash-based staleness detection.
//!
//! For every registered source and file entry, the checker compares the MD5
//! digest of the local file against the digest the publisher serves, and
//! collects everything stale into an `UpdatePlan`.
//!
//! The policy is intentionally asymmetric: when the remote digest cannot be
//! fetched or decoded, the entry is treated as stale (fail-open toward
//! updating). A redundant re-download is acceptable; silently never updating
//! because a transient network blip looked like "no update needed" is not.
//! Hosts that prefer quiet runs during a server outage can invert this via
//! `UpdaterConfig::assume_stale_on_hash_error`.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::source::{FileEntry, Updatable};
use crate::transport::HttpClient;
use crate::update::hash::{decode_remote_digest, local_digest};
use crate::update::plan::{PlannedSource, UpdatePlan};

/// Why an entry was found stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StaleReason {
    /// Local and remote digests differ (covers a missing local file, which
    /// hashes as zero bytes of content).
    HashMismatch,
    /// The local file exists but could not be read for hashing.
    LocalUnreadable,
    /// The remote digest could not be fetched.
    RemoteHashUnavailable,
    /// The remote digest payload could not be decoded.
    RemoteHashMalformed,
}

/// Staleness verdict for one file entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Staleness {
    /// Local content matches the published digest.
    Fresh,
    /// The entry needs updating.
    Stale(StaleReason),
}

impl Staleness {
    /// Whether this verdict puts the entry into the update plan.
    pub fn is_stale(&self) -> bool {
        matches!(self, Staleness::Stale(_))
    }
}

/// Determines which entries are stale by comparing content digests.
pub struct HashChecker {
    http: Arc<dyn HttpClient>,
    assume_stale_on_hash_error: bool,
}

impl HashChecker {
    /// Create a checker using the given transport and hash-failure policy.
    pub fn new(http: Arc<dyn HttpClient>, assume_stale_on_hash_error: bool) -> Self {
        Self {
            http,
            assume_stale_on_hash_error,
        }
    }

    /// Check a single entry.
    ///
    /// Never returns an error: every failure mode maps to a verdict, so one
    /// entry's problems cannot abort checking of its siblings.
    pub fn check_entry(&self, entry: &FileEntry) -> Staleness {
        let hash_url = entry.hash_url();

        let payload = match self.http.get_text(&hash_url) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(url = %hash_url, error = %e, "Remote digest fetch failed");
                return self.hash_error_verdict(StaleReason::RemoteHashUnavailable);
            }
        };

        let remote = match decode_remote_digest(&hash_url, &payload) {
            Ok(remote) => remote,
            Err(e) => {
                warn!(url = %hash_url, error = %e, "Remote digest malformed");
                return self.hash_error_verdict(StaleReason::RemoteHashMalformed);
            }
        };

        let local = match local_digest(&entry.local_path) {
            Ok(local) => local,
            Err(e) => {
                warn!(path = %entry.local_path.display(), error = %e, "Local file unreadable, forcing update");
                return Staleness::Stale(StaleReason::LocalUnreadable);
            }
        };

        if local == remote {
            Staleness::Fresh
        } else {
            Staleness::Stale(StaleReason::HashMismatch)
        }
    }

    fn hash_error_verdict(&self, reason: StaleReason) -> Staleness {
        if self.assume_stale_on_hash_error {
            Staleness::Stale(reason)
        } else {
            Staleness::Fresh
        }
    }

    /// Check every entry of every source and build the update plan.
    ///
    /// Sources with nothing stale are omitted. Plan order follows the
    /// registration order of the sources, giving reports a stable shape.
    pub fn build_plan(&self, sources: &[Arc<dyn Updatable>]) -> UpdatePlan {
        let mut plan = UpdatePlan::new();

        for source in sources {
            let name = source.display_name();
            let stale: Vec<FileEntry> = source
                .updatable_files()
                .into_iter()
                .filter(|entry| {
                    let verdict = self.check_entry(entry);
                    debug!(
                        source = %name,
                        file = %entry.file_name(),
                        verdict = ?verdict,
                        "Checked entry"
                    );
                    verdict.is_stale()
                })
                .collect();

            if !stale.is_empty() {
                debug!(source = %name, files = stale.len(), "Source has pending updates");
                plan.add_source(PlannedSource::new(name, stale));
            }
        }

        plan
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::source::StaticSource;
    use crate::transport::tests::MockHttpClient;

    // base64(MD5("hello world"))
    const HELLO_WORLD_MD5_B64: &str = "XrY7u+Ae7tCTyyK7j1rNww==";

    fn checker(mock: MockHttpClient, assume_stale: bool) -> HashChecker {
        HashChecker::new(Arc::new(mock), assume_stale)
    }

    #[test]
    fn test_matching_digest_is_fresh() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("foo.dll");
        fs::write(&path, b"hello world").unwrap();

        let mock = MockHttpClient::new();
        mock.respond("http://x/foo.dll.md5", HELLO_WORLD_MD5_B64);

        let entry = FileEntry::new("http://x/foo.dll", &path);
        assert_eq!(checker(mock, true).check_entry(&entry), Staleness::Fresh);
    }

    #[test]
    fn test_mismatched_digest_is_stale() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("foo.dll");
        fs::write(&path, b"outdated contents").unwrap();

        let mock = MockHttpClient::new();
        mock.respond("http://x/foo.dll.md5", HELLO_WORLD_MD5_B64);

        let entry = FileEntry::new("http://x/foo.dll", &path);
        assert_eq!(
            checker(mock, true).check_entry(&entry),
            Staleness::Stale(StaleReason::HashMismatch)
        );
    }

    #[test]
    fn test_absent_local_file_is_stale() {
        let temp = TempDir::new().unwrap();

        let mock = MockHttpClient::new();
        mock.respond("http://x/foo.dll.md5", HELLO_WORLD_MD5_B64);

        let entry = FileEntry::new("http://x/foo.dll", temp.path().join("never-installed.dll"));
        assert_eq!(
            checker(mock, true).check_entry(&entry),
            Staleness::Stale(StaleReason::HashMismatch)
        );
    }

    #[test]
    fn test_hash_fetch_failure_fails_open() {
        let entry = FileEntry::new("http://x/foo.dll", "/mods/foo.dll");
        assert_eq!(
            checker(MockHttpClient::new(), true).check_entry(&entry),
            Staleness::Stale(StaleReason::RemoteHashUnavailable)
        );
    }

    #[test]
    fn test_hash_fetch_failure_with_policy_inverted() {
        let entry = FileEntry::new("http://x/foo.dll", "/mods/foo.dll");
        assert_eq!(
            checker(MockHttpClient::new(), false).check_entry(&entry),
            Staleness::Fresh
        );
    }

    #[test]
    fn test_malformed_remote_digest_is_stale() {
        let mock = MockHttpClient::new();
        mock.respond("http://x/foo.dll.md5", "!!! not base64 !!!");

        let entry = FileEntry::new("http://x/foo.dll", "/mods/foo.dll");
        assert_eq!(
            checker(mock, true).check_entry(&entry),
            Staleness::Stale(StaleReason::RemoteHashMalformed)
        );
    }

    #[test]
    fn test_build_plan_omits_fresh_sources() {
        let temp = TempDir::new().unwrap();
        let fresh = temp.path().join("fresh.dll");
        fs::write(&fresh, b"hello world").unwrap();

        let mock = MockHttpClient::new();
        mock.respond("http://x/fresh.dll.md5", HELLO_WORLD_MD5_B64);
        mock.respond("http://x/stale.dll.md5", HELLO_WORLD_MD5_B64);

        let sources: Vec<Arc<dyn Updatable>> = vec![
            StaticSource::new("Fresh", vec![FileEntry::new("http://x/fresh.dll", &fresh)])
                .into_updatable(),
            StaticSource::new(
                "Stale",
                vec![FileEntry::new(
                    "http://x/stale.dll",
                    temp.path().join("stale.dll"),
                )],
            )
            .into_updatable(),
        ];

        let plan = checker(mock, true).build_plan(&sources);

        assert_eq!(plan.source_count(), 1);
        assert_eq!(plan.source_names(), vec!["Stale"]);
    }

    #[test]
    fn test_one_entry_failure_does_not_abort_sibling_checks() {
        let temp = TempDir::new().unwrap();

        let mock = MockHttpClient::new();
        // First entry's digest endpoint fails; second is fine and stale.
        mock.respond("http://x/b.dll.md5", HELLO_WORLD_MD5_B64);

        let sources: Vec<Arc<dyn Updatable>> = vec![StaticSource::new(
            "Foo",
            vec![
                FileEntry::new("http://x/a.dll", temp.path().join("a.dll")),
                FileEntry::new("http://x/b.dll", temp.path().join("b.dll")),
            ],
        )
        .into_updatable()];

        let plan = checker(mock, true).build_plan(&sources);

        assert_eq!(plan.file_count(), 2);
    }
}

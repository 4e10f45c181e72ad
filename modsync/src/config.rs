//! Updater configuration.
//!
//! This module defines `UpdaterConfig`, the tunables for one update session:
//! download concurrency, per-request timeout, staging directory root, and the
//! staleness policy applied when a remote hash cannot be fetched.

use std::path::PathBuf;
use std::time::Duration;

/// Default number of concurrent in-flight downloads within one source's batch.
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Default per-request timeout in seconds.
///
/// A hung request is indistinguishable from a slow one, so the transport
/// enforces a timeout and surfaces it through the same failure path as a
/// non-success response.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for an update session.
#[derive(Clone, Debug)]
pub struct UpdaterConfig {
    /// Maximum concurrent downloads within a single source's batch.
    pub concurrency: usize,

    /// Timeout applied to each HTTP request.
    pub request_timeout: Duration,

    /// Root directory under which per-source staging directories are created.
    pub staging_root: PathBuf,

    /// Staleness policy when the remote hash cannot be fetched or decoded.
    ///
    /// `true` (the default) treats the entry as stale, so a transient network
    /// blip is never mistaken for "no update needed" at the cost of a
    /// redundant re-download. `false` treats the entry as fresh, for hosts
    /// that prefer quiet runs during a server outage.
    pub assume_stale_on_hash_error: bool,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            staging_root: std::env::temp_dir(),
            assume_stale_on_hash_error: true,
        }
    }
}

impl UpdaterConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the download concurrency (minimum 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the staging root directory.
    pub fn with_staging_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.staging_root = root.into();
        self
    }

    /// Set the staleness policy applied on hash-fetch failure.
    pub fn with_assume_stale_on_hash_error(mut self, assume_stale: bool) -> Self {
        self.assume_stale_on_hash_error = assume_stale;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = UpdaterConfig::default();
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.request_timeout.as_secs(), 30);
        assert!(config.assume_stale_on_hash_error);
    }

    #[test]
    fn test_config_builder() {
        let config = UpdaterConfig::new()
            .with_concurrency(8)
            .with_request_timeout(Duration::from_secs(60))
            .with_staging_root("/tmp/staging")
            .with_assume_stale_on_hash_error(false);

        assert_eq!(config.concurrency, 8);
        assert_eq!(config.request_timeout.as_secs(), 60);
        assert_eq!(config.staging_root, PathBuf::from("/tmp/staging"));
        assert!(!config.assume_stale_on_hash_error);
    }

    #[test]
    fn test_config_min_concurrency() {
        let config = UpdaterConfig::new().with_concurrency(0);
        assert_eq!(config.concurrency, 1);
    }
}

//! The update session state machine.
//!
//! One session runs `Checking → AwaitingConfirmation → Updating →
//! AwaitingRetryConfirmation → Retrying → Reporting`, then offers a restart
//! if anything was committed. The user makes at most three decisions per
//! session regardless of how many files are involved: the initial
//! confirmation covering the whole plan, the retry confirmation, and the
//! final failure report.
//!
//! Failure containment: every per-entry and per-source error is aggregated
//! into the `SessionOutcome`; `run` itself is infallible and nothing escapes
//! to the host. Commits are durable the moment they happen, so a session
//! that dies later leaves already-committed sources committed.

use std::sync::Arc;
use std::thread;

use tracing::{error, info};

use crate::config::UpdaterConfig;
use crate::host::{AppControl, ProgressObserver, PromptService};
use crate::source::Updatable;
use crate::transport::HttpClient;
use crate::update::checker::HashChecker;
use crate::update::commit::{CommitManager, CommitOutcome};
use crate::update::downloader::Downloader;
use crate::update::plan::{PlannedSource, SessionOutcome, UpdatePlan};
use crate::store;

/// Drives one update session over a registry of updatable sources.
///
/// Constructed with everything it depends on (sources, transport, prompts,
/// app control); holds no state between sessions.
pub struct UpdateOrchestrator {
    sources: Vec<Arc<dyn Updatable>>,
    http: Arc<dyn HttpClient>,
    prompts: Arc<dyn PromptService>,
    app_control: Arc<dyn AppControl>,
    config: UpdaterConfig,
    observer: Option<ProgressObserver>,
}

impl UpdateOrchestrator {
    /// Create an orchestrator with default configuration.
    pub fn new(
        sources: Vec<Arc<dyn Updatable>>,
        http: Arc<dyn HttpClient>,
        prompts: Arc<dyn PromptService>,
        app_control: Arc<dyn AppControl>,
    ) -> Self {
        Self {
            sources,
            http,
            prompts,
            app_control,
            config: UpdaterConfig::default(),
            observer: None,
        }
    }

    /// Set the session configuration.
    pub fn with_config(mut self, config: UpdaterConfig) -> Self {
        self.config = config;
        self
    }

    /// Set a progress observer, the host's hook for a loading screen.
    pub fn with_observer(mut self, observer: ProgressObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Run the session on a worker thread.
    ///
    /// The caller may join the handle for the outcome or drop it; a dropped
    /// handle does not cancel the session, so an in-flight commit is never
    /// cut short.
    pub fn spawn(self) -> thread::JoinHandle<SessionOutcome> {
        thread::spawn(move || self.run())
    }

    /// Run one complete session to its outcome.
    pub fn run(&self) -> SessionOutcome {
        let mut outcome = SessionOutcome::new();

        // Checking: build the plan. An empty plan ends the session with no
        // prompts and no side effects.
        let checker = HashChecker::new(
            Arc::clone(&self.http),
            self.config.assume_stale_on_hash_error,
        );
        let plan = checker.build_plan(&self.sources);

        if plan.is_empty() {
            info!("All sources up to date");
            return outcome;
        }

        info!(
            sources = plan.source_count(),
            files = plan.file_count(),
            "Updates available"
        );

        // AwaitingConfirmation: one yes/no covering the whole plan.
        let message = format!(
            "Updates are available for: {}. Download and install them?",
            plan.source_names().join(", ")
        );
        if !self.prompts.confirm(&message, "Update") {
            info!("User declined updates");
            return outcome;
        }

        // Updating: download and commit each source, in plan order.
        for planned in plan.sources() {
            match self.attempt_source(planned, 1) {
                CommitOutcome::Committed { files } => outcome.record_commit(&planned.name, files),
                CommitOutcome::Failed { failing_files } => {
                    outcome.record_failure(&planned.name, failing_files)
                }
            }
        }

        // AwaitingRetryConfirmation → Retrying: one retry round over each
        // failed source's original planned file list. A commit attempt is
        // all-or-nothing per source, so the whole list is re-attempted, not
        // just the subset that failed.
        if outcome.has_failures() {
            let failed = outcome.failed_sources.len();
            let message = format!(
                "{failed} source(s) failed to update. Retry the failed updates?"
            );
            if self.prompts.confirm(&message, "Retry") {
                let failed_names: Vec<String> =
                    outcome.failed_sources.keys().cloned().collect();
                for name in failed_names {
                    let Some(planned) = plan.get(&name) else {
                        continue;
                    };
                    match self.attempt_source(planned, 2) {
                        CommitOutcome::Committed { files } => outcome.record_commit(&name, files),
                        CommitOutcome::Failed { failing_files } => {
                            outcome.record_failure(&name, failing_files)
                        }
                    }
                }
            }
        }

        // Reporting: purely informational, single retry round by design.
        if outcome.has_failures() {
            self.prompts.notify(&self.failure_report(&outcome));
        }

        info!(
            committed = outcome.files_committed,
            failed_sources = outcome.failed_sources.len(),
            "Update session finished"
        );

        // Committed files take effect next launch regardless; the restart
        // prompt just offers to make that launch happen now.
        if outcome.committed_anything() {
            let restart = self.prompts.confirm(
                "Some files were updated. Do you want to restart the application?",
                "Restart",
            );
            if restart {
                self.app_control.relaunch();
            }
        }

        outcome
    }

    /// Download and commit one source, as one all-or-nothing attempt.
    fn attempt_source(&self, planned: &PlannedSource, attempt: u32) -> CommitOutcome {
        let staging_dir = self.config.staging_root.join(format!(
            "modsync_{}_{}_{}",
            std::process::id(),
            sanitize(&planned.name),
            attempt
        ));

        if let Err(e) = store::create_dir_all(&staging_dir) {
            error!(source = %planned.name, error = %e, "Failed to create staging directory");
            return CommitOutcome::Failed {
                failing_files: planned.entries.iter().map(|e| e.file_name()).collect(),
            };
        }

        let downloader = Downloader::new(Arc::clone(&self.http), self.config.concurrency);
        let staging = downloader.download_all(
            &planned.name,
            &planned.entries,
            &staging_dir,
            self.observer.as_ref(),
        );

        CommitManager::new().commit(&planned.name, staging)
    }

    /// Format the final failure report: one line per source, naming the
    /// files that remain failing.
    fn failure_report(&self, outcome: &SessionOutcome) -> String {
        let mut report = String::from("Some updates could not be installed:");
        for (source, files) in &outcome.failed_sources {
            report.push_str(&format!("\n- {}: {}", source, files.join(", ")));
        }
        report
    }
}

/// Directory-name-safe form of a source's display name.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect()
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::host::tests::{RecordingAppControl, ScriptedPrompt};
    use crate::source::{FileEntry, StaticSource};
    use crate::transport::tests::MockHttpClient;

    fn orchestrator(
        sources: Vec<Arc<dyn Updatable>>,
        mock: MockHttpClient,
        prompt: Arc<ScriptedPrompt>,
        control: Arc<RecordingAppControl>,
        staging: &TempDir,
    ) -> UpdateOrchestrator {
        UpdateOrchestrator::new(sources, Arc::new(mock), prompt, control)
            .with_config(UpdaterConfig::new().with_staging_root(staging.path()))
    }

    #[test]
    fn test_empty_registry_ends_without_prompts() {
        let staging = TempDir::new().unwrap();
        let prompt = Arc::new(ScriptedPrompt::answering(&[]));
        let control = Arc::new(RecordingAppControl::new());

        let outcome = orchestrator(
            vec![],
            MockHttpClient::new(),
            Arc::clone(&prompt),
            Arc::clone(&control),
            &staging,
        )
        .run();

        assert_eq!(outcome.files_committed, 0);
        assert!(prompt.confirmations.lock().unwrap().is_empty());
        assert!(prompt.notifications.lock().unwrap().is_empty());
        assert_eq!(control.relaunch_count(), 0);
    }

    #[test]
    fn test_fresh_sources_end_without_prompts() {
        let staging = TempDir::new().unwrap();
        let local = TempDir::new().unwrap();
        let path = local.path().join("foo.dll");
        std::fs::write(&path, b"hello world").unwrap();

        let mock = MockHttpClient::new();
        // base64(MD5("hello world")) matches the local file.
        mock.respond("http://x/foo.dll.md5", "XrY7u+Ae7tCTyyK7j1rNww==");

        let prompt = Arc::new(ScriptedPrompt::answering(&[]));
        let control = Arc::new(RecordingAppControl::new());
        let sources: Vec<Arc<dyn Updatable>> = vec![StaticSource::new(
            "Foo",
            vec![FileEntry::new("http://x/foo.dll", &path)],
        )
        .into_updatable()];

        let outcome =
            orchestrator(sources, mock, Arc::clone(&prompt), control, &staging).run();

        assert_eq!(outcome.files_committed, 0);
        assert!(prompt.confirmations.lock().unwrap().is_empty());
    }

    #[test]
    fn test_confirmation_names_all_pending_sources() {
        let staging = TempDir::new().unwrap();
        let local = TempDir::new().unwrap();

        let mock = MockHttpClient::new();
        mock.respond("http://x/a.dll.md5", "XrY7u+Ae7tCTyyK7j1rNww==");
        mock.respond("http://x/b.dll.md5", "XrY7u+Ae7tCTyyK7j1rNww==");

        let prompt = Arc::new(ScriptedPrompt::answering(&[false]));
        let control = Arc::new(RecordingAppControl::new());
        let sources: Vec<Arc<dyn Updatable>> = vec![
            StaticSource::new(
                "Alpha",
                vec![FileEntry::new("http://x/a.dll", local.path().join("a.dll"))],
            )
            .into_updatable(),
            StaticSource::new(
                "Beta",
                vec![FileEntry::new("http://x/b.dll", local.path().join("b.dll"))],
            )
            .into_updatable(),
        ];

        orchestrator(sources, mock, Arc::clone(&prompt), control, &staging).run();

        let confirmations = prompt.confirmations.lock().unwrap();
        assert_eq!(confirmations.len(), 1);
        assert!(confirmations[0].contains("Alpha"));
        assert!(confirmations[0].contains("Beta"));
    }

    #[test]
    fn test_spawned_session_can_be_joined() {
        let staging = TempDir::new().unwrap();
        let prompt = Arc::new(ScriptedPrompt::answering(&[]));
        let control = Arc::new(RecordingAppControl::new());

        let handle = orchestrator(
            vec![],
            MockHttpClient::new(),
            prompt,
            control,
            &staging,
        )
        .spawn();

        let outcome = handle.join().unwrap();
        assert_eq!(outcome.files_committed, 0);
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("My Mod (v2)"), "my-mod--v2-");
        assert_eq!(sanitize("plain"), "plain");
    }
}

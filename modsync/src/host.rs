//! Host integration points.
//!
//! The update engine never draws UI or restarts a process itself; it asks
//! the host to do so through these traits. A session makes at most three
//! user decisions regardless of how many files are involved: the initial
//! confirmation, the retry confirmation, and the final report.

use std::sync::Arc;

/// User-facing prompt service.
///
/// `confirm` blocks the session until the user answers; how the host renders
/// the prompt (modal dialog, console prompt, ...) is its own business.
pub trait PromptService: Send + Sync {
    /// Ask a yes/no question. Returns `true` if the user accepted.
    fn confirm(&self, message: &str, confirm_label: &str) -> bool;

    /// Present an informational message the user can only acknowledge.
    fn notify(&self, message: &str);
}

/// Application lifecycle control.
pub trait AppControl: Send + Sync {
    /// Relaunch the host application. Called at most once per session, after
    /// the user accepts the restart prompt.
    fn relaunch(&self);
}

/// Observer for session progress, the host's hook for a loading screen.
///
/// # Arguments
///
/// * first - display name of the source currently being updated
/// * second - name of the file currently being fetched
pub type ProgressObserver = Arc<dyn Fn(&str, &str) + Send + Sync>;

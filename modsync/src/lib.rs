//! ModSync - self-update engine for plugin ecosystems.
//!
//! Each registered source (plugin) publishes a map from remote artifact URLs
//! to local install paths. ModSync reconciles the two: it detects stale
//! files by content digest, asks the user once for consent, downloads
//! replacements into a staging area, and commits each source atomically so a
//! working install is never left half-patched by a mid-transfer failure.
//!
//! The host supplies its own UI and lifecycle glue through the traits in
//! [`host`]; the engine itself never draws anything or restarts a process.

pub mod config;
pub mod error;
pub mod host;
pub mod source;
pub mod store;
pub mod transport;
pub mod update;

pub use config::UpdaterConfig;
pub use error::{UpdaterError, UpdaterResult};
pub use host::{AppControl, ProgressObserver, PromptService};
pub use source::{FileEntry, StaticSource, Updatable};
pub use transport::{HttpClient, ReqwestClient};
pub use update::{SessionOutcome, UpdateOrchestrator};

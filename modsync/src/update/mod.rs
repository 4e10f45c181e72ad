//! The update engine: staleness detection, staged downloads, atomic commit,
//! and the session orchestrator.
//!
//! # Architecture
//!
//! ```text
//! UpdateOrchestrator (session state machine)
//!         │
//!         ├── HashChecker (staleness detection → UpdatePlan)
//!         │
//!         ├── Downloader (bounded fan-out → StagingResult)
//!         │
//!         └── CommitManager (all-or-nothing replace / rollback)
//! ```
//!
//! Data flows through the session once: the checker's plan feeds the
//! confirmation gate, confirmed sources feed download and commit, commit
//! failures feed the single retry round, and the terminal state feeds the
//! report and restart prompts.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use modsync::{ReqwestClient, UpdateOrchestrator, UpdaterConfig};
//!
//! let orchestrator = UpdateOrchestrator::new(sources, Arc::new(ReqwestClient::new()?), prompts, app_control)
//!     .with_config(UpdaterConfig::new().with_concurrency(3));
//!
//! // Fire and forget, or join for the outcome.
//! let outcome = orchestrator.spawn().join().expect("session panicked");
//! println!("{} file(s) updated", outcome.files_committed);
//! ```

mod checker;
mod commit;
mod downloader;
mod hash;
mod orchestrator;
mod plan;

pub use checker::{HashChecker, StaleReason, Staleness};
pub use commit::{CommitManager, CommitOutcome};
pub use downloader::Downloader;
pub use hash::{decode_remote_digest, local_digest};
pub use orchestrator::UpdateOrchestrator;
pub use plan::{PlannedSource, SessionOutcome, StagingResult, UpdatePlan};

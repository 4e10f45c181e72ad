//! ModSync console host.
//!
//! Loads a JSON source manifest, runs one update session against it, and
//! reports the outcome. The interesting machinery lives in the `modsync`
//! library; this binary only wires it to a real HTTP client, console
//! prompts, and process relaunch.

mod manifest;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use modsync::{
    AppControl, HttpClient, ProgressObserver, PromptService, ReqwestClient, UpdateOrchestrator,
    UpdaterConfig,
};

use ui::{AssumeYesPrompt, ConsolePrompt, ProcessControl};

/// Check registered sources for updates and install them.
#[derive(Debug, Parser)]
#[command(name = "modsync", version, about)]
struct Cli {
    /// Path to the JSON source manifest.
    manifest: PathBuf,

    /// Maximum concurrent downloads within one source.
    #[arg(long, default_value_t = 3)]
    concurrency: usize,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Directory for staging downloads (defaults to the system temp dir).
    #[arg(long)]
    staging_root: Option<PathBuf>,

    /// Answer yes to every prompt (non-interactive runs).
    #[arg(long)]
    yes: bool,

    /// Treat a failed hash lookup as up to date instead of stale.
    #[arg(long)]
    skip_on_hash_error: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let sources = manifest::load_sources(&cli.manifest)?;
    if sources.is_empty() {
        println!("Manifest declares no sources; nothing to do.");
        return Ok(());
    }

    let mut config = UpdaterConfig::new()
        .with_concurrency(cli.concurrency)
        .with_request_timeout(Duration::from_secs(cli.timeout_secs))
        .with_assume_stale_on_hash_error(!cli.skip_on_hash_error);
    if let Some(root) = cli.staging_root {
        config = config.with_staging_root(root);
    }

    let http: Arc<dyn HttpClient> = Arc::new(ReqwestClient::with_timeout(config.request_timeout)?);
    let prompts: Arc<dyn PromptService> = if cli.yes {
        Arc::new(AssumeYesPrompt)
    } else {
        Arc::new(ConsolePrompt)
    };
    let app_control: Arc<dyn AppControl> = Arc::new(ProcessControl);

    let observer: ProgressObserver = Arc::new(|source: &str, file: &str| {
        println!("  {} {}", console::style(source).cyan(), file);
    });

    let outcome = UpdateOrchestrator::new(sources, http, prompts, app_control)
        .with_config(config)
        .with_observer(observer)
        .run();

    if outcome.committed_anything() {
        println!("{} file(s) updated.", outcome.files_committed);
    } else {
        println!("No files were updated.");
    }

    if outcome.has_failures() {
        std::process::exit(1);
    }

    Ok(())
}

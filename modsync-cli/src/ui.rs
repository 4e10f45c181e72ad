//! Console implementations of the host integration traits.

use std::env;
use std::process::Command;

use console::style;
use dialoguer::Confirm;
use tracing::{error, info};

use modsync::{AppControl, PromptService};

/// Interactive console prompts via dialoguer.
pub struct ConsolePrompt;

impl PromptService for ConsolePrompt {
    fn confirm(&self, message: &str, confirm_label: &str) -> bool {
        Confirm::new()
            .with_prompt(format!("{message} [{confirm_label}]"))
            .default(false)
            .interact()
            .unwrap_or(false)
    }

    fn notify(&self, message: &str) {
        println!("{}", style(message).yellow());
    }
}

/// Non-interactive prompt service that accepts everything, for scripted
/// runs (`--yes`). Still echoes what it decided so logs stay readable.
pub struct AssumeYesPrompt;

impl PromptService for AssumeYesPrompt {
    fn confirm(&self, message: &str, confirm_label: &str) -> bool {
        println!("{} {}", style(message).dim(), style(confirm_label).green());
        true
    }

    fn notify(&self, message: &str) {
        println!("{}", style(message).yellow());
    }
}

/// Relaunches the console host by re-executing the current binary with the
/// same arguments.
pub struct ProcessControl;

impl AppControl for ProcessControl {
    fn relaunch(&self) {
        let Ok(exe) = env::current_exe() else {
            error!("Cannot determine current executable, skipping relaunch");
            return;
        };

        match Command::new(&exe).args(env::args_os().skip(1)).spawn() {
            Ok(_) => {
                info!(exe = %exe.display(), "Relaunched");
                std::process::exit(0);
            }
            Err(e) => {
                error!(error = %e, "Relaunch failed");
            }
        }
    }
}

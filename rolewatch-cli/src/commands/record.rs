//! One change watcher cycle on the tracked configuration file.

use super::local_now;
use crate::error::{CliError, CliResult};
use colored::Colorize;
use rolewatch_audit::{ChangeWatcher, WatchOutcome};
use rolewatch_config::Settings;

/// Record command
pub fn execute(settings: &Settings, actor: Option<&str>) -> CliResult<()> {
    let watcher = ChangeWatcher::new(settings.role_audit.clone());
    let config_file = &settings.role_audit.config_file;

    match watcher.on_save(config_file, actor, local_now()) {
        WatchOutcome::Recorded { events, lines } => {
            println!(
                "{} {} change(s), {} line(s) appended to {}",
                "✓".green(),
                events,
                lines,
                settings.role_audit.log_file.display()
            );
        }
        WatchOutcome::Unchanged => println!("{} No role changes", "✓".green()),
        WatchOutcome::Bootstrapped => println!(
            "{} Baseline created at {}",
            "✓".green(),
            settings.role_audit.baseline_file.display()
        ),
        WatchOutcome::Disabled => println!("{} Role change auditing is disabled", "-".dimmed()),
        WatchOutcome::Ignored => {
            return Err(CliError::Failed(format!(
                "{} is not the tracked configuration file",
                config_file.display()
            )));
        }
        WatchOutcome::Skipped(reason) => return Err(CliError::Failed(reason)),
    }

    Ok(())
}

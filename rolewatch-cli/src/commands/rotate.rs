//! Rotate one of the two managed logs.

use super::local_now;
use crate::error::{CliError, CliResult};
use clap::ValueEnum;
use colored::Colorize;
use rolewatch_audit::{LogRotator, RotationOutcome};
use rolewatch_config::{RotationConfig, Settings};

/// Which log a command acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Target {
    /// The role change log
    Roles,
    /// The audit log
    Audit,
}

impl Target {
    pub fn job_name(&self) -> &'static str {
        match self {
            Target::Roles => "role-change-log",
            Target::Audit => "audit-log",
        }
    }

    pub fn config(&self, settings: &Settings) -> RotationConfig {
        match self {
            Target::Roles => settings.role_audit.rotation.clone(),
            Target::Audit => settings.audit_log_rotation.clone(),
        }
    }

    pub fn rotator(&self, settings: &Settings) -> LogRotator {
        LogRotator::new(self.job_name(), self.config(settings))
    }
}

/// Rotate command
pub async fn execute(settings: &Settings, target: Target, now: bool) -> CliResult<()> {
    let rotator = target.rotator(settings);
    let outcome = if now {
        rotator.rotate(local_now()).await?
    } else {
        rotator.tick(local_now()).await
    };

    report(&rotator, outcome)
}

fn report(rotator: &LogRotator, outcome: RotationOutcome) -> CliResult<()> {
    let log = rotator.config().log_file;
    match outcome {
        RotationOutcome::Rotated { archive, uploaded } => {
            println!("{} Rotated {} to {}", "✓".green(), log.display(), archive.display());
            if uploaded {
                println!("{} Uploaded archive", "✓".green());
            } else if rotator.config().upload {
                println!("{} Upload failed; archive kept locally", "!".yellow());
            }
        }
        RotationOutcome::NotDue => println!(
            "{} Not scheduled this minute ({})",
            "-".dimmed(),
            rotator.config().cron
        ),
        RotationOutcome::Disabled => println!("{} Rotation is disabled", "-".dimmed()),
        RotationOutcome::Skipped => {
            println!("{} Nothing to rotate at {}", "-".dimmed(), log.display())
        }
        RotationOutcome::Failed(reason) => return Err(CliError::Failed(reason)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_config() {
        let settings = Settings::with_home("/srv/ci");

        assert_eq!(
            Target::Roles.config(&settings).log_file,
            settings.role_audit.log_file
        );
        assert_eq!(Target::Audit.config(&settings).prefix(), "audit-logs");
        assert_ne!(Target::Roles.job_name(), Target::Audit.job_name());
    }

    #[tokio::test]
    async fn test_rotate_now() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::with_home(dir.path());
        std::fs::create_dir_all(dir.path().join("logs")).unwrap();
        std::fs::write(&settings.audit_log_rotation.log_file, "entry\n").unwrap();

        execute(&settings, Target::Audit, true).await.unwrap();

        assert!(!settings.audit_log_rotation.log_file.exists());
        assert_eq!(
            std::fs::read_dir(dir.path().join("logs")).unwrap().count(),
            1
        );
    }
}

//! Long-running host: rotation schedulers plus an optional save watcher.

use super::local_now;
use super::rotate::Target;
use crate::error::{CliError, CliResult};
use colored::Colorize;
use notify::RecursiveMode;
use notify_debouncer_mini::{DebounceEventResult, new_debouncer};
use rolewatch_audit::{ChangeWatcher, WatchOutcome};
use rolewatch_config::Settings;
use rolewatch_cron::CronScheduler;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{info, warn};

const DEBOUNCE: Duration = Duration::from_millis(500);
const POLL: Duration = Duration::from_millis(100);

/// Run command
pub async fn execute(settings: &Settings, watch: bool, actor: Option<String>) -> CliResult<()> {
    let mut scheduler = CronScheduler::new();
    for target in [Target::Roles, Target::Audit] {
        let rotator = Arc::new(target.rotator(settings));
        rotator.schedule(&scheduler).await?;
        println!(
            "  {} {} rotation: {} ({})",
            "→".green(),
            target.job_name(),
            rotator.config().log_file.display(),
            schedule_label(&rotator.config())
        );
    }
    scheduler.start().await?;

    let running = Arc::new(AtomicBool::new(true));

    // The debouncer stops delivering events once dropped, so it lives here
    let mut watch_state = None;
    if watch {
        let config_file = settings.role_audit.config_file.clone();
        let (tx, rx) = std::sync::mpsc::channel();
        let mut debouncer = new_debouncer(DEBOUNCE, tx)?;
        debouncer
            .watcher()
            .watch(&watch_dir(&config_file), RecursiveMode::NonRecursive)?;

        let watcher = ChangeWatcher::new(settings.role_audit.clone());
        let handle = spawn_watch_loop(watcher, rx, actor, Arc::clone(&running));
        println!("  {} Watching {}", "→".green(), config_file.display());
        watch_state = Some((debouncer, handle));
    }

    println!("  {} Press {} to stop", "→".dimmed(), "Ctrl+C".yellow());

    let signal = tokio::signal::ctrl_c().await;

    info!("Shutting down");
    running.store(false, Ordering::SeqCst);
    scheduler.stop().await?;

    if let Some((debouncer, handle)) = watch_state {
        drop(debouncer);
        tokio::task::spawn_blocking(move || handle.join())
            .await
            .map_err(|e| CliError::Watch(e.to_string()))?
            .map_err(|_| CliError::Watch("watch thread panicked".to_string()))?;
    }

    signal?;
    Ok(())
}

fn schedule_label(config: &rolewatch_config::RotationConfig) -> String {
    if config.enabled {
        config.cron.clone()
    } else {
        "disabled".to_string()
    }
}

/// Directory to watch for saves of `config_file`.
///
/// Watching the directory rather than the file also catches saves that
/// replace the file.
fn watch_dir(config_file: &Path) -> PathBuf {
    match config_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn spawn_watch_loop(
    watcher: ChangeWatcher,
    rx: Receiver<DebounceEventResult>,
    actor: Option<String>,
    running: Arc<AtomicBool>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        while running.load(Ordering::SeqCst) {
            match rx.recv_timeout(POLL) {
                Ok(Ok(events)) => {
                    if events.iter().any(|e| watcher.is_tracked(&e.path)) {
                        handle_save(&watcher, actor.as_deref());
                    }
                }
                Ok(Err(e)) => warn!(error = %e, "Watch error"),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    })
}

fn handle_save(watcher: &ChangeWatcher, actor: Option<&str>) {
    let config_file = &watcher.config().config_file;
    match watcher.on_save(config_file, actor, local_now()) {
        WatchOutcome::Recorded { events, .. } => {
            println!("  {} Recorded {} role change(s)", "✓".green(), events);
        }
        WatchOutcome::Skipped(reason) => {
            println!("  {} Skipped audit: {}", "!".yellow(), reason);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_dir() {
        assert_eq!(watch_dir(Path::new("/srv/ci/config.xml")), Path::new("/srv/ci"));
        assert_eq!(watch_dir(Path::new("config.xml")), Path::new("."));
    }

    #[test]
    fn test_watch_loop_records_tracked_saves() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("logs")).unwrap();
        let settings = Settings::with_home(dir.path());
        let audit = settings.role_audit.clone();
        std::fs::write(&audit.config_file, "<hudson/>").unwrap();

        let (tx, rx) = std::sync::mpsc::channel::<DebounceEventResult>();
        let running = Arc::new(AtomicBool::new(true));
        let handle = spawn_watch_loop(
            ChangeWatcher::new(audit.clone()),
            rx,
            None,
            Arc::clone(&running),
        );

        tx.send(Ok(vec![notify_debouncer_mini::DebouncedEvent {
            path: audit.config_file.clone(),
            kind: notify_debouncer_mini::DebouncedEventKind::Any,
        }]))
        .unwrap();
        drop(tx);
        handle.join().unwrap();

        assert!(audit.baseline_file.exists());
    }
}

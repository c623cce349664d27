//! rolewatch - role change auditing and log rotation.
//!
//! # Commands
//!
//! - `rolewatch diff <old> <new>` - Print the changes between two snapshots
//! - `rolewatch record` - Audit the tracked configuration file once
//! - `rolewatch rotate <roles|audit>` - Run one rotation tick (or rotate now)
//! - `rolewatch check` - Validate settings
//! - `rolewatch run` - Run the rotation schedulers, optionally watching for saves

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rolewatch_config::Settings;
use std::path::PathBuf;

mod commands;
mod error;
mod logging;

use commands::{check, diff, record, rotate, run};
use error::CliResult;

/// Role change auditing and log rotation
#[derive(Parser)]
#[command(name = "rolewatch")]
#[command(version)]
#[command(about = "Audit RBAC role changes and rotate audit logs on a cron schedule")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (TOML or JSON)
    #[arg(short, long, global = true, env = "ROLEWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the role changes between two configuration snapshots
    Diff(DiffArgs),

    /// Compare the tracked configuration file with its baseline and log changes
    Record(RecordArgs),

    /// Rotate a log file
    Rotate(RotateArgs),

    /// Validate settings and print diagnostics
    #[command(alias = "validate")]
    Check,

    /// Run the rotation schedulers until interrupted
    Run(RunArgs),
}

#[derive(Args)]
struct DiffArgs {
    /// Previous snapshot
    old: PathBuf,

    /// Current snapshot
    new: PathBuf,

    /// Who made the change
    #[arg(short, long)]
    actor: Option<String>,
}

#[derive(Args)]
struct RecordArgs {
    /// Who made the change
    #[arg(short, long)]
    actor: Option<String>,
}

#[derive(Args)]
struct RotateArgs {
    /// Which log to rotate
    #[arg(value_enum)]
    target: rotate::Target,

    /// Rotate immediately instead of checking the schedule
    #[arg(long)]
    now: bool,
}

#[derive(Args)]
struct RunArgs {
    /// Also audit the tracked configuration file whenever it changes
    #[arg(short, long)]
    watch: bool,

    /// Actor recorded for changes picked up by the watcher
    #[arg(short, long)]
    actor: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logging::init(&logging::LogConfig::from_env().with_flags(cli.verbose, cli.quiet));

    let result = dispatch(cli).await;

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn dispatch(cli: Cli) -> CliResult<()> {
    let config = cli.config;
    let load = || Settings::load(config.as_deref());

    match cli.command {
        Commands::Diff(args) => diff::execute(&args.old, &args.new, args.actor.as_deref()),
        Commands::Record(args) => record::execute(&load()?, args.actor.as_deref()),
        Commands::Rotate(args) => rotate::execute(&load()?, args.target, args.now).await,
        Commands::Check => check::execute(&load()?),
        Commands::Run(args) => run::execute(&load()?, args.watch, args.actor).await,
    }
}

//! Snapwatch CLI - snapwatch command

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cmd;
mod config;
mod progress;
mod util;

/// Snapwatch - polling change detection for directory trees
#[derive(Parser)]
#[command(name = "snapwatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: snapwatch.toml next to the executable)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// No progress bar while hashing
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan every configured root once and report changes
    Scan,
    /// Scan periodically until Ctrl-C
    Watch {
        /// Seconds between scans (default: interval_secs from the config)
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Show the saved state of every configured root
    Status {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Configuration file helpers
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show where the config file is read from
    Path,
    /// Print an example config file
    Example,
}

/// Install the global subscriber; the guard must live until exit
fn init_logging(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let Some(path) = log_file else {
        tracing_subscriber::registry().with(filter).with(console).init();
        return Ok(None);
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .with_context(|| format!("Invalid log file path: {}", path.display()))?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    let file = fmt::layer().with_writer(writer).with_ansi(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .init();
    Ok(Some(guard))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.log_file.as_deref())?;
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Scan => cmd::scan::run(config, cli.quiet).await,
        Commands::Watch { interval } => cmd::watch::run(config, interval, cli.quiet).await,
        Commands::Status { json } => cmd::status::run(config, json).await,
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Path => cmd::config::run_path(config).await,
            ConfigCommands::Example => cmd::config::run_example().await,
        },
    }
}

//! Resumable sequential task runner.
//!
//! Drains a declarative task catalog (`tasks.toml`) against a durable
//! progress record (`.drover/state.json`), retrying failed attempts with
//! backoff and escalating to registered fallbacks before giving up. Exit
//! codes are stable so `run` composes with larger automation pipelines.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use drover::exit_codes;
use drover::fallback::FallbackRegistry;
use drover::io::catalog::TaskCatalog;
use drover::io::config::load_config;
use drover::io::event_log::EventLog;
use drover::io::executor::ProcessExecutor;
use drover::io::paths::{EnginePaths, paths_from_dir};
use drover::retry::ThreadSleeper;
use drover::run::run_engine;
use drover::status::{load_summary, render_summary, reset};

#[derive(Parser)]
#[command(name = "drover", version, about = "Resumable sequential task runner")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Drain every eligible task in the catalog to a terminal state.
    Run {
        /// Task catalog path (defaults to `tasks.toml` in the workspace).
        #[arg(short, long)]
        catalog: Option<PathBuf>,
        /// Workspace root holding `.drover/` (defaults to the current directory).
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// Summarize the persisted progress record.
    Status {
        /// Also print the last N raw execution-log lines.
        #[arg(long)]
        tail: Option<usize>,
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// Delete the progress record and execution log. The catalog is untouched.
    Reset {
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// Load and validate the task catalog without running anything.
    Validate {
        #[arg(short, long)]
        catalog: Option<PathBuf>,
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

fn main() {
    drover::logging::init();
    let cli = Cli::parse();
    let code = match dispatch(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn dispatch(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Run { catalog, dir } => cmd_run(catalog, dir),
        Command::Status { tail, dir } => cmd_status(tail, dir),
        Command::Reset { dir } => cmd_reset(dir),
        Command::Validate { catalog, dir } => cmd_validate(catalog, dir),
    }
}

fn resolve_catalog(paths: &EnginePaths, catalog: Option<PathBuf>) -> PathBuf {
    catalog.unwrap_or_else(|| paths.default_catalog_path())
}

fn cmd_run(catalog: Option<PathBuf>, dir: Option<PathBuf>) -> Result<i32> {
    let paths = paths_from_dir(dir.as_deref());
    let config = load_config(&paths.config_path)?;
    let catalog = TaskCatalog::load(&resolve_catalog(&paths, catalog), &config)?;
    let registry = FallbackRegistry::from_catalog(&catalog, &config);

    let outcome = run_engine(
        &paths,
        &catalog,
        &registry,
        &ProcessExecutor,
        &ThreadSleeper,
        &config,
    )?;

    println!(
        "run finished: {} completed, {} failed ({} executed this invocation)",
        outcome.completed.len(),
        outcome.failed.len(),
        outcome.executed,
    );
    if outcome.all_succeeded() {
        Ok(exit_codes::OK)
    } else {
        let failed: Vec<&str> = outcome.failed.iter().map(String::as_str).collect();
        println!("failed tasks: {}", failed.join(", "));
        println!("see {} for per-attempt details", paths.log_path.display());
        Ok(exit_codes::TASKS_FAILED)
    }
}

fn cmd_status(tail: Option<usize>, dir: Option<PathBuf>) -> Result<i32> {
    let paths = paths_from_dir(dir.as_deref());
    let summary = load_summary(&paths)?;
    print!("{}", render_summary(&summary));

    if let Some(n) = tail {
        let lines = EventLog::new(&paths.log_path).tail(n)?;
        if !lines.is_empty() {
            println!("--- last {} log line(s) ---", lines.len());
            for line in &lines {
                println!("{line}");
            }
        }
    }
    Ok(exit_codes::OK)
}

fn cmd_reset(dir: Option<PathBuf>) -> Result<i32> {
    let paths = paths_from_dir(dir.as_deref());
    reset(&paths)?;
    println!("progress record reset; next run starts from scratch");
    Ok(exit_codes::OK)
}

fn cmd_validate(catalog: Option<PathBuf>, dir: Option<PathBuf>) -> Result<i32> {
    let paths = paths_from_dir(dir.as_deref());
    let config = load_config(&paths.config_path)?;
    let path = resolve_catalog(&paths, catalog);
    let catalog = TaskCatalog::load(&path, &config)?;
    println!("catalog ok: {} task(s)", catalog.len());
    Ok(exit_codes::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_run_defaults() {
        let cli = Cli::parse_from(["drover", "run"]);
        assert!(matches!(
            cli.command,
            Command::Run {
                catalog: None,
                dir: None
            }
        ));
    }

    #[test]
    fn parse_status_with_tail() {
        let cli = Cli::parse_from(["drover", "status", "--tail", "20"]);
        assert!(matches!(
            cli.command,
            Command::Status {
                tail: Some(20),
                dir: None
            }
        ));
    }
}

//! Status reporting and destructive reset of the progress record.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::core::summary::{StatusSummary, summarize};
use crate::io::paths::EnginePaths;
use crate::io::progress::ProgressStore;

/// Load the persisted state and reduce it to a summary.
///
/// A missing record summarizes as an empty run; a corrupt one is the same
/// distinct error `run` reports.
pub fn load_summary(paths: &EnginePaths) -> Result<StatusSummary> {
    let state = ProgressStore::new(&paths.state_path).load()?;
    Ok(summarize(&state))
}

/// Render the operator-facing summary.
pub fn render_summary(summary: &StatusSummary) -> String {
    let mut out = format!(
        "Tasks: {} total, {} completed, {} failed, {} pending ({}% success)\n",
        summary.total_tasks,
        summary.completed.len(),
        summary.failed.len(),
        summary.pending,
        summary.success_percent,
    );
    out.push_str(&format!(
        "In flight: {}\n",
        summary.current_task.as_deref().unwrap_or("none")
    ));
    if let Some(start) = &summary.start_time {
        out.push_str(&format!("Started: {start}\n"));
    }
    if let Some(update) = &summary.last_update {
        out.push_str(&format!("Last update: {update}\n"));
    }
    if !summary.completed.is_empty() {
        out.push_str(&format!("Completed: {}\n", summary.completed.join(", ")));
    }
    if !summary.failed.is_empty() {
        out.push_str(&format!("Failed: {}\n", summary.failed.join(", ")));
    }
    out
}

/// Delete the persisted progress record and execution log.
///
/// The next run starts from a fresh empty state. The task catalog is not
/// engine-owned and is never touched.
pub fn reset(paths: &EnginePaths) -> Result<()> {
    remove_if_exists(&paths.state_path)?;
    remove_if_exists(&paths.log_path)?;
    info!(dir = %paths.engine_dir.display(), "progress record and log removed");
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("remove {}", path.display())),
    }
}

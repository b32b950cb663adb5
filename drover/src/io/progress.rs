//! Durable progress record (`.drover/state.json`).
//!
//! The progress record is the engine's only durable artifact. It is written
//! after every task transition so a hard kill loses at most the in-flight
//! task's progress.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::outcome::TaskOutcome;
use crate::io::now_rfc3339;

/// Persisted bookkeeping of which tasks have reached a terminal state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecutionState {
    /// Ids that finished with success.
    pub completed_tasks: BTreeSet<String>,
    /// Ids that exhausted retries and fallback without success.
    pub failed_tasks: BTreeSet<String>,
    /// Id currently in flight. Crash forensics only; resumption re-attempts
    /// the task from scratch.
    pub current_task: Option<String>,
    /// Catalog size as of the last state write. Informational.
    pub total_tasks: u32,
    /// Set once when the first task of this lineage starts.
    pub start_time: Option<String>,
    /// Rewritten on every mutation.
    pub last_update: Option<String>,
}

impl ExecutionState {
    /// Whether `id` has reached a terminal state in this lineage.
    pub fn is_terminal(&self, id: &str) -> bool {
        self.completed_tasks.contains(id) || self.failed_tasks.contains(id)
    }

    /// Pure in-memory transition: mark `id` as in flight.
    pub fn record_started(&mut self, id: &str) {
        self.current_task = Some(id.to_string());
    }

    /// Pure in-memory transition: move `id` into its terminal set and clear
    /// the in-flight marker.
    pub fn record_terminal(&mut self, id: &str, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Completed => {
                self.completed_tasks.insert(id.to_string());
            }
            TaskOutcome::Failed => {
                self.failed_tasks.insert(id.to_string());
            }
        }
        if self.current_task.as_deref() == Some(id) {
            self.current_task = None;
        }
    }
}

/// Persisted record exists but cannot be parsed.
///
/// Deliberately distinct from a task failure: silently treating corrupt
/// state as empty would re-run already-completed tasks.
#[derive(Debug)]
pub struct CorruptStateError {
    pub path: PathBuf,
    pub detail: String,
}

impl fmt::Display for CorruptStateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "corrupt progress record {}: {} (refusing to guess at state; `drover reset` discards it)",
            self.path.display(),
            self.detail
        )
    }
}

impl std::error::Error for CorruptStateError {}

/// Durable store for [`ExecutionState`]. Every mutating operation persists
/// before returning.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    state_path: PathBuf,
}

impl ProgressStore {
    pub fn new(state_path: impl Into<PathBuf>) -> Self {
        Self {
            state_path: state_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.state_path
    }

    /// Load the current state, or a fresh empty state if none exists.
    ///
    /// A missing file is never an error; an unparseable file is a
    /// [`CorruptStateError`].
    pub fn load(&self) -> Result<ExecutionState> {
        let contents = match fs::read_to_string(&self.state_path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.state_path.display(), "no progress record, starting fresh");
                return Ok(ExecutionState::default());
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("read progress record {}", self.state_path.display()));
            }
        };
        let state: ExecutionState = serde_json::from_str(&contents).map_err(|err| {
            anyhow::Error::new(CorruptStateError {
                path: self.state_path.clone(),
                detail: err.to_string(),
            })
        })?;
        debug!(
            completed = state.completed_tasks.len(),
            failed = state.failed_tasks.len(),
            "progress record loaded"
        );
        Ok(state)
    }

    /// Atomically overwrite the persisted record (temp file + rename).
    ///
    /// A partial write never corrupts the previous valid record.
    pub fn save(&self, state: &ExecutionState) -> Result<()> {
        let parent = self.state_path.parent().with_context(|| {
            format!("progress record path missing parent {}", self.state_path.display())
        })?;
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
        let mut buf = serde_json::to_string_pretty(state)?;
        buf.push('\n');
        let tmp_path = self.state_path.with_extension("json.tmp");
        fs::write(&tmp_path, buf)
            .with_context(|| format!("write temp progress record {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.state_path)
            .with_context(|| format!("replace progress record {}", self.state_path.display()))?;
        Ok(())
    }

    /// Record `task_id` as in flight and persist.
    pub fn mark_started(&self, state: &mut ExecutionState, task_id: &str) -> Result<()> {
        state.record_started(task_id);
        if state.start_time.is_none() {
            state.start_time = Some(now_rfc3339());
        }
        state.last_update = Some(now_rfc3339());
        self.save(state)
    }

    /// Record `task_id` as terminal and persist.
    pub fn mark_terminal(
        &self,
        state: &mut ExecutionState,
        task_id: &str,
        outcome: TaskOutcome,
    ) -> Result<()> {
        state.record_terminal(task_id, outcome);
        state.last_update = Some(now_rfc3339());
        self.save(state)
    }
}

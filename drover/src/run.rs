//! The scheduler loop: drain every eligible task to a terminal state.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use tracing::{info, instrument, warn};

use crate::core::outcome::{AttemptOutcome, TaskOutcome};
use crate::core::select::next_eligible;
use crate::fallback::FallbackRegistry;
use crate::io::catalog::TaskCatalog;
use crate::io::config::EngineConfig;
use crate::io::event_log::EventLog;
use crate::io::executor::{CommandRequest, Executor};
use crate::io::paths::EnginePaths;
use crate::io::progress::ProgressStore;
use crate::retry::{RetryVerdict, Sleeper, run_with_retries};

/// Aggregate result of one engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// Tasks attempted by this invocation (already-terminal tasks are
    /// skipped and not counted).
    pub executed: u32,
    /// Cumulative completed ids, including prior runs of this lineage.
    pub completed: BTreeSet<String>,
    /// Cumulative permanently-failed ids.
    pub failed: BTreeSet<String>,
}

impl RunOutcome {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Drive the catalog until no eligible task remains.
///
/// Strictly sequential: one task is in flight at a time, and its terminal
/// state is persisted before the next task is selected. A task's permanent
/// failure never halts the drain. Re-invoking against a fully resolved
/// catalog executes nothing and returns immediately.
#[instrument(skip_all, fields(tasks = catalog.len()))]
pub fn run_engine<E: Executor, S: Sleeper>(
    paths: &EnginePaths,
    catalog: &TaskCatalog,
    registry: &FallbackRegistry,
    executor: &E,
    sleeper: &S,
    config: &EngineConfig,
) -> Result<RunOutcome> {
    let store = ProgressStore::new(&paths.state_path);
    let log = EventLog::new(&paths.log_path);

    let mut state = store.load().context("load progress record")?;
    if let Some(stale) = &state.current_task {
        // A previous invocation died while this task was in flight. It is
        // still eligible and restarts from attempt 1.
        warn!(task = %stale, "previous run was interrupted mid-task");
        log.append("interrupted_run_detected", &[("task", stale)])?;
    }
    state.total_tasks = catalog.len() as u32;

    log.append("run_started", &[("tasks", &catalog.len().to_string())])?;

    let mut executed = 0u32;
    while let Some(task) = next_eligible(catalog, &state) {
        let task = task.clone();
        executed += 1;

        store
            .mark_started(&mut state, &task.id)
            .with_context(|| format!("mark task '{}' started", task.id))?;
        log.append(
            "task_started",
            &[
                ("task", &task.id),
                ("max_attempts", &task.max_attempts.to_string()),
                ("timeout_secs", &task.timeout_secs.to_string()),
            ],
        )?;
        info!(task = %task.id, description = %task.description, "task started");

        let request = CommandRequest {
            argv: task.command.clone(),
            timeout: task.timeout(),
            output_limit_bytes: config.output_limit_bytes,
        };
        let verdict = run_with_retries(
            executor,
            sleeper,
            &request,
            &task.id,
            task.max_attempts,
            config.retry_base_delay(),
            &log,
        )?;

        let outcome = match verdict {
            RetryVerdict::Succeeded { .. } => TaskOutcome::Completed,
            RetryVerdict::Exhausted { attempts, last } => {
                info!(task = %task.id, attempts, last = %last.describe(), "retries exhausted");
                escalate_to_fallback(&task.id, registry, executor, &log)?
            }
        };

        store
            .mark_terminal(&mut state, &task.id, outcome)
            .with_context(|| format!("mark task '{}' terminal", task.id))?;
        match outcome {
            TaskOutcome::Completed => {
                log.append("task_completed", &[("task", &task.id)])?;
                info!(task = %task.id, "task completed");
            }
            TaskOutcome::Failed => {
                log.append("task_failed", &[("task", &task.id)])?;
                warn!(task = %task.id, "task permanently failed");
            }
        }
    }

    let outcome = RunOutcome {
        executed,
        completed: state.completed_tasks.clone(),
        failed: state.failed_tasks.clone(),
    };
    log.append(
        "run_finished",
        &[
            ("executed", &outcome.executed.to_string()),
            ("completed", &outcome.completed.len().to_string()),
            ("failed", &outcome.failed.len().to_string()),
        ],
    )?;
    info!(
        executed = outcome.executed,
        completed = outcome.completed.len(),
        failed = outcome.failed.len(),
        "run finished"
    );
    Ok(outcome)
}

/// Give the task its one-shot fallback, if any is registered.
fn escalate_to_fallback(
    task_id: &str,
    registry: &FallbackRegistry,
    executor: &dyn Executor,
    log: &EventLog,
) -> Result<TaskOutcome> {
    let Some(strategy) = registry.get(task_id) else {
        log.append("fallback_missing", &[("task", task_id)])?;
        return Ok(TaskOutcome::Failed);
    };

    log.append(
        "fallback_started",
        &[("task", task_id), ("strategy", &strategy.describe())],
    )?;
    // A strategy error is contained like any attempt failure so the drain
    // continues with the next task.
    let outcome = match strategy.attempt(executor) {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(task = task_id, err = %err, "fallback errored");
            AttemptOutcome::Failure { exit_code: None }
        }
    };
    log.append(
        "fallback_finished",
        &[("task", task_id), ("outcome", &outcome.describe())],
    )?;

    if outcome.is_success() {
        Ok(TaskOutcome::Completed)
    } else {
        Ok(TaskOutcome::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::outcome::AttemptOutcome;
    use crate::test_support::{TestWorkspace, catalog, fast_config, task, task_with};

    #[test]
    fn drains_catalog_in_order() {
        let workspace = TestWorkspace::new();
        let catalog = catalog(vec![task("first", &["true"]), task("second", &["true"])]);
        let executor = crate::test_support::ScriptedExecutor::new(vec![
            AttemptOutcome::Success,
            AttemptOutcome::Success,
        ]);
        let sleeper = crate::test_support::RecordingSleeper::default();

        let outcome = run_engine(
            &workspace.paths(),
            &catalog,
            &FallbackRegistry::new(),
            &executor,
            &sleeper,
            &fast_config(),
        )
        .expect("run");

        assert_eq!(outcome.executed, 2);
        assert!(outcome.all_succeeded());
        let calls = executor.calls();
        assert_eq!(calls[0], vec!["true".to_string()]);
    }

    #[test]
    fn failed_task_does_not_halt_the_drain() {
        let workspace = TestWorkspace::new();
        let catalog = catalog(vec![
            task("ok-1", &["true"]),
            task_with("doomed", &["false"], 2, 300),
            task("ok-2", &["true"]),
        ]);
        let executor = crate::test_support::ScriptedExecutor::new(vec![
            AttemptOutcome::Success,
            AttemptOutcome::Failure { exit_code: Some(1) },
            AttemptOutcome::Failure { exit_code: Some(1) },
            AttemptOutcome::Success,
        ]);
        let sleeper = crate::test_support::RecordingSleeper::default();

        let outcome = run_engine(
            &workspace.paths(),
            &catalog,
            &FallbackRegistry::new(),
            &executor,
            &sleeper,
            &fast_config(),
        )
        .expect("run");

        assert_eq!(outcome.executed, 3);
        assert!(outcome.completed.contains("ok-1"));
        assert!(outcome.completed.contains("ok-2"));
        assert!(outcome.failed.contains("doomed"));
        assert_eq!(executor.call_count(), 4);
    }
}

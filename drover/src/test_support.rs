//! Test-only scripted collaborators and catalog builders.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

use anyhow::Result;

use crate::core::outcome::AttemptOutcome;
use crate::io::catalog::{TaskCatalog, TaskSpec};
use crate::io::config::EngineConfig;
use crate::io::executor::{CommandRequest, Executor};
use crate::io::paths::EnginePaths;
use crate::retry::Sleeper;

/// Executor that replays a queue of predetermined verdicts and records
/// every argv it was asked to run. Panics when the queue runs dry so a
/// test never silently over-executes.
pub struct ScriptedExecutor {
    responses: RefCell<VecDeque<AttemptOutcome>>,
    calls: RefCell<Vec<Vec<String>>>,
}

impl ScriptedExecutor {
    pub fn new(responses: Vec<AttemptOutcome>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    /// Every argv run so far, in order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }
}

impl Executor for ScriptedExecutor {
    fn run(&self, request: &CommandRequest) -> Result<AttemptOutcome> {
        self.calls.borrow_mut().push(request.argv.clone());
        let outcome = self
            .responses
            .borrow_mut()
            .pop_front()
            .expect("scripted executor ran out of responses");
        Ok(outcome)
    }
}

/// Sleeper that records requested delays without taking them.
#[derive(Default)]
pub struct RecordingSleeper {
    slept: RefCell<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn slept(&self) -> Vec<Duration> {
        self.slept.borrow().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.slept.borrow_mut().push(duration);
    }
}

/// Deterministic task with default budgets and no fallback.
pub fn task(id: &str, argv: &[&str]) -> TaskSpec {
    TaskSpec {
        id: id.to_string(),
        command: argv.iter().map(|s| s.to_string()).collect(),
        description: format!("{id} description"),
        max_attempts: 3,
        timeout_secs: 300,
        fallback_command: None,
    }
}

/// Task with explicit attempt/timeout budgets.
pub fn task_with(id: &str, argv: &[&str], max_attempts: u32, timeout_secs: u64) -> TaskSpec {
    TaskSpec {
        max_attempts,
        timeout_secs,
        ..task(id, argv)
    }
}

/// Task with a declared fallback command.
pub fn task_with_fallback(id: &str, argv: &[&str], fallback: &[&str]) -> TaskSpec {
    TaskSpec {
        fallback_command: Some(fallback.iter().map(|s| s.to_string()).collect()),
        ..task(id, argv)
    }
}

/// Validated catalog from specs.
pub fn catalog(tasks: Vec<TaskSpec>) -> TaskCatalog {
    TaskCatalog::from_tasks(tasks).expect("valid catalog")
}

/// Engine config with backoff disabled so tests never wait.
pub fn fast_config() -> EngineConfig {
    EngineConfig {
        retry_base_delay_secs: 0,
        ..EngineConfig::default()
    }
}

/// `CommandRequest` with test budgets.
pub fn command_request(argv: &[&str]) -> CommandRequest {
    CommandRequest {
        argv: argv.iter().map(|s| s.to_string()).collect(),
        timeout: Duration::from_secs(5),
        output_limit_bytes: 10_000,
    }
}

/// Isolated engine workspace backed by a temp directory.
pub struct TestWorkspace {
    temp: tempfile::TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp: tempfile::tempdir().expect("tempdir"),
        }
    }

    pub fn paths(&self) -> EnginePaths {
        EnginePaths::new(self.temp.path())
    }
}

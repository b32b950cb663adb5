//! Fallback strategies: a second, qualitatively different way for a named
//! task to succeed after its retries are exhausted.
//!
//! The registry is an explicit, enumerable table keyed by task id. This is
//! the only place task-specific knowledge is allowed to enter the otherwise
//! generic engine; new strategies are additive registrations, not branches
//! in the scheduler.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Result;

use crate::core::outcome::AttemptOutcome;
use crate::io::catalog::TaskCatalog;
use crate::io::config::EngineConfig;
use crate::io::executor::{CommandRequest, Executor};

/// One-shot remediation procedure. Invoked at most once per run for its
/// task; the engine never retries a fallback.
pub trait FallbackStrategy {
    /// Short label for the execution log.
    fn describe(&self) -> String;

    /// Attempt the remediation. The verdict becomes the task's final
    /// outcome.
    fn attempt(&self, executor: &dyn Executor) -> Result<AttemptOutcome>;
}

/// Fallback that runs an alternative command through the same executor.
pub struct CommandFallback {
    argv: Vec<String>,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl CommandFallback {
    pub fn new(argv: Vec<String>, timeout: Duration, output_limit_bytes: usize) -> Self {
        Self {
            argv,
            timeout,
            output_limit_bytes,
        }
    }
}

impl FallbackStrategy for CommandFallback {
    fn describe(&self) -> String {
        format!("command:{}", self.argv.first().map(String::as_str).unwrap_or(""))
    }

    fn attempt(&self, executor: &dyn Executor) -> Result<AttemptOutcome> {
        executor.run(&CommandRequest {
            argv: self.argv.clone(),
            timeout: self.timeout,
            output_limit_bytes: self.output_limit_bytes,
        })
    }
}

/// Explicit lookup from task id to its registered fallback strategy.
#[derive(Default)]
pub struct FallbackRegistry {
    strategies: BTreeMap<String, Box<dyn FallbackStrategy>>,
}

impl FallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `strategy` for `task_id`, replacing any previous entry.
    pub fn register(&mut self, task_id: impl Into<String>, strategy: Box<dyn FallbackStrategy>) {
        self.strategies.insert(task_id.into(), strategy);
    }

    pub fn get(&self, task_id: &str) -> Option<&dyn FallbackStrategy> {
        self.strategies.get(task_id).map(Box::as_ref)
    }

    /// Registered task ids, in stable order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.strategies.keys().map(String::as_str)
    }

    /// Build a registry from the catalog's declared `fallback_command`
    /// entries. Each fallback runs under its task's own timeout.
    pub fn from_catalog(catalog: &TaskCatalog, config: &EngineConfig) -> Self {
        let mut registry = Self::new();
        for task in catalog.tasks() {
            if let Some(argv) = &task.fallback_command {
                registry.register(
                    task.id.clone(),
                    Box::new(CommandFallback::new(
                        argv.clone(),
                        task.timeout(),
                        config.output_limit_bytes,
                    )),
                );
            }
        }
        registry
    }
}

//! Task catalog: the ordered, immutable list of task definitions for a run.
//!
//! The catalog is a human-edited TOML file with a `[[tasks]]` array. A
//! malformed catalog is fatal at load time, before any task runs, so the
//! engine never executes against an inconsistent definition list.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::io::config::EngineConfig;

/// One immutable task definition.
///
/// `command` is a structured argv (program + arguments); the engine never
/// passes it through a shell. Catalogs that need shell syntax spell it out
/// as `["sh", "-c", "..."]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    pub id: String,
    pub command: Vec<String>,
    pub description: String,
    pub max_attempts: u32,
    pub timeout_secs: u64,
    /// Alternative argv attempted once after retries are exhausted.
    pub fallback_command: Option<Vec<String>>,
}

impl TaskSpec {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Ordered list of validated task definitions. Never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCatalog {
    tasks: Vec<TaskSpec>,
}

/// Catalog rejected at load time. Collects every violation so an operator
/// can fix the file in one pass.
#[derive(Debug)]
pub struct CatalogError {
    pub path: Option<PathBuf>,
    pub violations: Vec<String>,
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "invalid task catalog {}:", path.display())?,
            None => write!(f, "invalid task catalog:")?,
        }
        for violation in &self.violations {
            write!(f, "\n- {violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CatalogError {}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    tasks: Vec<RawTask>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTask {
    #[serde(default)]
    id: String,
    #[serde(default)]
    command: Vec<String>,
    #[serde(default)]
    description: String,
    max_attempts: Option<u32>,
    timeout_secs: Option<u64>,
    fallback_command: Option<Vec<String>>,
}

impl TaskCatalog {
    /// Load and validate a catalog, resolving per-task defaults from `config`.
    pub fn load(path: &Path, config: &EngineConfig) -> Result<Self> {
        debug!(path = %path.display(), "loading task catalog");
        let contents =
            fs::read_to_string(path).with_context(|| format!("read catalog {}", path.display()))?;
        let file: CatalogFile =
            toml::from_str(&contents).with_context(|| format!("parse catalog {}", path.display()))?;

        let tasks: Vec<TaskSpec> = file
            .tasks
            .into_iter()
            .map(|raw| TaskSpec {
                id: raw.id,
                command: raw.command,
                description: raw.description,
                max_attempts: raw.max_attempts.unwrap_or(config.max_attempts_default),
                timeout_secs: raw.timeout_secs.unwrap_or(config.task_timeout_secs_default),
                fallback_command: raw.fallback_command,
            })
            .collect();

        Self::from_tasks(tasks).map_err(|mut err| {
            err.path = Some(path.to_path_buf());
            anyhow::Error::new(err)
        })
    }

    /// Build a catalog from already-resolved specs, enforcing the same
    /// invariants as [`TaskCatalog::load`].
    pub fn from_tasks(tasks: Vec<TaskSpec>) -> std::result::Result<Self, CatalogError> {
        let violations = validate(&tasks);
        if violations.is_empty() {
            Ok(Self { tasks })
        } else {
            Err(CatalogError {
                path: None,
                violations,
            })
        }
    }

    pub fn tasks(&self) -> &[TaskSpec] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&TaskSpec> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

fn validate(tasks: &[TaskSpec]) -> Vec<String> {
    let mut violations = Vec::new();
    let mut seen: BTreeSet<&str> = BTreeSet::new();

    for (index, task) in tasks.iter().enumerate() {
        let label = if task.id.is_empty() {
            format!("task #{}", index + 1)
        } else {
            format!("task '{}'", task.id)
        };

        if task.id.trim().is_empty() {
            violations.push(format!("{label}: missing id"));
        } else if !seen.insert(&task.id) {
            violations.push(format!("{label}: duplicate id"));
        }
        if task.command.is_empty() || task.command[0].trim().is_empty() {
            violations.push(format!("{label}: command must be a non-empty array"));
        }
        if task.max_attempts == 0 {
            violations.push(format!("{label}: max_attempts must be > 0"));
        }
        if task.timeout_secs == 0 {
            violations.push(format!("{label}: timeout_secs must be > 0"));
        }
        if let Some(fallback) = &task.fallback_command
            && (fallback.is_empty() || fallback[0].trim().is_empty())
        {
            violations.push(format!("{label}: fallback_command must be a non-empty array"));
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_catalog(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("tasks.toml");
        fs::write(&path, contents).expect("write catalog");
        path
    }

    /// Omitted budgets resolve to engine config defaults.
    #[test]
    fn load_applies_config_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = write_catalog(
            temp.path(),
            r#"
[[tasks]]
id = "link-dotfiles"
command = ["ln", "-sf", "a", "b"]
description = "link dotfiles into place"

[[tasks]]
id = "install-hooks"
command = ["sh", "-c", "./hooks.sh"]
max_attempts = 5
timeout_secs = 60
"#,
        );

        let catalog = TaskCatalog::load(&path, &EngineConfig::default()).expect("load");
        assert_eq!(catalog.len(), 2);

        let first = catalog.get("link-dotfiles").expect("first task");
        assert_eq!(first.max_attempts, 3);
        assert_eq!(first.timeout_secs, 300);

        let second = catalog.get("install-hooks").expect("second task");
        assert_eq!(second.max_attempts, 5);
        assert_eq!(second.timeout_secs, 60);
    }

    /// All violations are reported at once, before any task could run.
    #[test]
    fn load_rejects_malformed_entries() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = write_catalog(
            temp.path(),
            r#"
[[tasks]]
id = "dup"
command = ["true"]

[[tasks]]
id = "dup"
command = []

[[tasks]]
command = ["true"]
max_attempts = 0
"#,
        );

        let err = TaskCatalog::load(&path, &EngineConfig::default()).unwrap_err();
        let catalog_err = err.downcast_ref::<CatalogError>().expect("catalog error");
        assert!(catalog_err.violations.iter().any(|v| v.contains("duplicate id")));
        assert!(catalog_err.violations.iter().any(|v| v.contains("non-empty array")));
        assert!(catalog_err.violations.iter().any(|v| v.contains("missing id")));
        assert!(catalog_err.violations.iter().any(|v| v.contains("max_attempts")));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = write_catalog(
            temp.path(),
            r#"
[[tasks]]
id = "a"
command = ["true"]
retries = 2
"#,
        );

        let err = TaskCatalog::load(&path, &EngineConfig::default()).unwrap_err();
        assert!(format!("{err:#}").contains("parse catalog"));
    }
}

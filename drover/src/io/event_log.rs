//! Append-only execution log (`.drover/engine.log`).
//!
//! One timestamped line per engine event: run start/finish, task starts,
//! attempt verdicts, backoff waits, fallback invocations, terminal
//! transitions. Write-only from the engine's perspective; the engine never
//! parses it back. This is a product artifact, distinct from `tracing`
//! diagnostics (see `logging`).

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::io::now_rfc3339;

#[derive(Debug, Clone)]
pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one `timestamp event key=value ...` line.
    pub fn append(&self, event: &str, fields: &[(&str, &str)]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create log directory {}", parent.display()))?;
        }
        let mut line = format!("{} {}", now_rfc3339(), event);
        for (key, value) in fields {
            line.push_str(&format!(" {key}={value}"));
        }
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open log {}", self.path.display()))?;
        file.write_all(line.as_bytes())
            .with_context(|| format!("append to log {}", self.path.display()))?;
        Ok(())
    }

    /// Last `n` raw lines, oldest first. A missing log reads as empty.
    pub fn tail(&self, n: usize) -> Result<Vec<String>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(err).with_context(|| format!("read log {}", self.path.display()));
            }
        };
        let lines: Vec<String> = contents.lines().map(str::to_string).collect();
        let skip = lines.len().saturating_sub(n);
        Ok(lines[skip..].to_vec())
    }
}

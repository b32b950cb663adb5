//! Executor abstraction for task commands.
//!
//! The [`Executor`] trait decouples the retry/fallback machinery from real
//! process execution. Tests use scripted executors that return predetermined
//! verdicts without spawning processes.

use std::process::Command;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, instrument, warn};

use crate::core::outcome::AttemptOutcome;
use crate::io::process::run_command_with_timeout;

/// Parameters for one command invocation.
#[derive(Debug, Clone)]
pub struct CommandRequest {
    /// Program and arguments. Never interpreted by a shell.
    pub argv: Vec<String>,
    /// Maximum time for this single attempt.
    pub timeout: Duration,
    /// Truncate captured stdout/stderr beyond this many bytes.
    pub output_limit_bytes: usize,
}

/// Abstraction over command execution backends.
pub trait Executor {
    /// Run the command once and classify the result. Attempt-level problems
    /// (non-zero exit, timeout, unspawnable program) are verdicts, not
    /// errors; `Err` is reserved for engine-internal failures.
    fn run(&self, request: &CommandRequest) -> Result<AttemptOutcome>;
}

/// Executor that spawns the command as a child process.
pub struct ProcessExecutor;

impl Executor for ProcessExecutor {
    #[instrument(skip_all, fields(program = request.argv.first().map(String::as_str).unwrap_or(""), timeout_secs = request.timeout.as_secs()))]
    fn run(&self, request: &CommandRequest) -> Result<AttemptOutcome> {
        let Some((program, args)) = request.argv.split_first() else {
            warn!("empty argv");
            return Ok(AttemptOutcome::Failure { exit_code: None });
        };

        let mut cmd = Command::new(program);
        cmd.args(args);

        let output = match run_command_with_timeout(cmd, request.timeout, request.output_limit_bytes)
        {
            Ok(output) => output,
            Err(err) => {
                // A command that cannot be spawned is a failed attempt, not
                // an engine error; the drain must continue.
                warn!(err = %err, "command could not be run");
                return Ok(AttemptOutcome::Failure { exit_code: None });
            }
        };

        if output.timed_out {
            return Ok(AttemptOutcome::TimedOut);
        }
        if output.status.success() {
            debug!("command succeeded");
            return Ok(AttemptOutcome::Success);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!(exit_code = ?output.status.code(), stderr = %stderr.trim(), "command failed");
        Ok(AttemptOutcome::Failure {
            exit_code: output.status.code(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(argv: &[&str], timeout: Duration) -> CommandRequest {
        CommandRequest {
            argv: argv.iter().map(|s| s.to_string()).collect(),
            timeout,
            output_limit_bytes: 10_000,
        }
    }

    #[test]
    fn zero_exit_is_success() {
        let outcome = ProcessExecutor
            .run(&request(&["true"], Duration::from_secs(5)))
            .expect("run");
        assert_eq!(outcome, AttemptOutcome::Success);
    }

    #[test]
    fn nonzero_exit_reports_the_code() {
        let outcome = ProcessExecutor
            .run(&request(&["sh", "-c", "exit 7"], Duration::from_secs(5)))
            .expect("run");
        assert_eq!(outcome, AttemptOutcome::Failure { exit_code: Some(7) });
    }

    #[test]
    fn overrun_is_classified_as_timeout() {
        let outcome = ProcessExecutor
            .run(&request(&["sh", "-c", "sleep 5"], Duration::from_millis(200)))
            .expect("run");
        assert_eq!(outcome, AttemptOutcome::TimedOut);
    }

    /// An unspawnable program is a contained attempt failure.
    #[test]
    fn missing_program_is_a_failed_attempt() {
        let outcome = ProcessExecutor
            .run(&request(
                &["drover-no-such-binary-x"],
                Duration::from_secs(5),
            ))
            .expect("run");
        assert_eq!(outcome, AttemptOutcome::Failure { exit_code: None });
    }
}

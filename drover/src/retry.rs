//! Bounded retry policy around a single executor.

use std::time::Duration;

use anyhow::{Result, ensure};
use tracing::{debug, info};

use crate::core::backoff::backoff_delay;
use crate::core::outcome::AttemptOutcome;
use crate::io::event_log::EventLog;
use crate::io::executor::{CommandRequest, Executor};

/// Blocking sleep seam so tests can observe waits without taking them.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Real sleeper used by the CLI.
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Final verdict of a bounded retry sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryVerdict {
    Succeeded { attempts: u32 },
    Exhausted { attempts: u32, last: AttemptOutcome },
}

/// Run `request` through `executor` at most `max_attempts` times.
///
/// Returns on the first success. Failed attempts wait
/// `backoff_delay(attempt, base_delay)` before the next one; no attempt
/// begins before its scheduled delay has elapsed. Every attempt and wait is
/// recorded in the execution log.
pub fn run_with_retries<E: Executor, S: Sleeper>(
    executor: &E,
    sleeper: &S,
    request: &CommandRequest,
    task_id: &str,
    max_attempts: u32,
    base_delay: Duration,
    log: &EventLog,
) -> Result<RetryVerdict> {
    ensure!(max_attempts > 0, "max_attempts must be > 0");

    for attempt in 1..=max_attempts {
        let outcome = executor.run(request)?;
        log.append(
            "attempt",
            &[
                ("task", task_id),
                ("attempt", &format!("{attempt}/{max_attempts}")),
                ("outcome", &outcome.describe()),
            ],
        )?;

        if outcome.is_success() {
            debug!(task = task_id, attempt, "attempt succeeded");
            return Ok(RetryVerdict::Succeeded { attempts: attempt });
        }

        if attempt < max_attempts {
            let delay = backoff_delay(attempt, base_delay);
            info!(task = task_id, attempt, delay_secs = delay.as_secs(), "retrying after backoff");
            log.append(
                "retry_wait",
                &[("task", task_id), ("delay_secs", &delay.as_secs().to_string())],
            )?;
            sleeper.sleep(delay);
        } else {
            return Ok(RetryVerdict::Exhausted {
                attempts: attempt,
                last: outcome,
            });
        }
    }

    unreachable!("loop returns on the final attempt")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingSleeper, ScriptedExecutor, command_request};

    fn log_in(temp: &tempfile::TempDir) -> EventLog {
        EventLog::new(temp.path().join("engine.log"))
    }

    #[test]
    fn success_short_circuits_remaining_attempts() {
        let temp = tempfile::tempdir().expect("tempdir");
        let executor = ScriptedExecutor::new(vec![
            AttemptOutcome::Failure { exit_code: Some(1) },
            AttemptOutcome::Success,
        ]);
        let sleeper = RecordingSleeper::default();

        let verdict = run_with_retries(
            &executor,
            &sleeper,
            &command_request(&["true"]),
            "a",
            3,
            Duration::from_secs(5),
            &log_in(&temp),
        )
        .expect("retry");

        assert_eq!(verdict, RetryVerdict::Succeeded { attempts: 2 });
        assert_eq!(executor.call_count(), 2);
        assert_eq!(sleeper.slept(), vec![Duration::from_secs(5)]);
    }

    /// Exactly `max_attempts` invocations for a command that always fails.
    #[test]
    fn exhaustion_invokes_executor_exactly_max_attempts_times() {
        let temp = tempfile::tempdir().expect("tempdir");
        let executor = ScriptedExecutor::new(vec![
            AttemptOutcome::Failure { exit_code: Some(1) },
            AttemptOutcome::TimedOut,
            AttemptOutcome::Failure { exit_code: Some(2) },
        ]);
        let sleeper = RecordingSleeper::default();

        let verdict = run_with_retries(
            &executor,
            &sleeper,
            &command_request(&["false"]),
            "a",
            3,
            Duration::from_secs(5),
            &log_in(&temp),
        )
        .expect("retry");

        assert_eq!(
            verdict,
            RetryVerdict::Exhausted {
                attempts: 3,
                last: AttemptOutcome::Failure { exit_code: Some(2) },
            }
        );
        assert_eq!(executor.call_count(), 3);
    }

    /// Waits grow strictly between attempts, and none follows the last one.
    #[test]
    fn backoff_waits_increase_and_stop_after_final_attempt() {
        let temp = tempfile::tempdir().expect("tempdir");
        let executor = ScriptedExecutor::new(vec![
            AttemptOutcome::Failure { exit_code: Some(1) },
            AttemptOutcome::Failure { exit_code: Some(1) },
            AttemptOutcome::Failure { exit_code: Some(1) },
        ]);
        let sleeper = RecordingSleeper::default();

        run_with_retries(
            &executor,
            &sleeper,
            &command_request(&["false"]),
            "a",
            3,
            Duration::from_secs(5),
            &log_in(&temp),
        )
        .expect("retry");

        let slept = sleeper.slept();
        assert_eq!(slept.len(), 2);
        assert!(slept[0] < slept[1]);
    }
}

//! Shared outcome types for attempts and tasks.
//!
//! These types define stable contracts between engine components. They must
//! remain deterministic and free of I/O concerns.

use serde::{Deserialize, Serialize};

/// Verdict of a single command attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Zero exit within the timeout window.
    Success,
    /// Non-zero exit within the timeout window. `exit_code` is `None` when
    /// the process was terminated by a signal.
    Failure { exit_code: Option<i32> },
    /// The process did not finish in time and was killed.
    TimedOut,
}

impl AttemptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Success)
    }

    /// Short label for execution log lines.
    pub fn describe(&self) -> String {
        match self {
            AttemptOutcome::Success => "success".to_string(),
            AttemptOutcome::Failure {
                exit_code: Some(code),
            } => format!("exit={code}"),
            AttemptOutcome::Failure { exit_code: None } => "killed".to_string(),
            AttemptOutcome::TimedOut => "timeout".to_string(),
        }
    }
}

/// Terminal state of a task within a run lineage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskOutcome {
    Completed,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_labels_are_stable() {
        assert_eq!(AttemptOutcome::Success.describe(), "success");
        assert_eq!(
            AttemptOutcome::Failure { exit_code: Some(7) }.describe(),
            "exit=7"
        );
        assert_eq!(
            AttemptOutcome::Failure { exit_code: None }.describe(),
            "killed"
        );
        assert_eq!(AttemptOutcome::TimedOut.describe(), "timeout");
    }
}

//! Read-only summarization of the progress record.

use crate::io::progress::ExecutionState;

/// Aggregate view of an [`ExecutionState`], ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSummary {
    pub total_tasks: u32,
    pub completed: Vec<String>,
    pub failed: Vec<String>,
    pub pending: u32,
    /// `completed / total * 100`, truncated. Zero when the catalog is empty.
    pub success_percent: u32,
    pub current_task: Option<String>,
    pub start_time: Option<String>,
    pub last_update: Option<String>,
}

pub fn summarize(state: &ExecutionState) -> StatusSummary {
    let completed: Vec<String> = state.completed_tasks.iter().cloned().collect();
    let failed: Vec<String> = state.failed_tasks.iter().cloned().collect();
    let resolved = (completed.len() + failed.len()) as u32;
    let success_percent = if state.total_tasks == 0 {
        0
    } else {
        completed.len() as u32 * 100 / state.total_tasks
    };

    StatusSummary {
        total_tasks: state.total_tasks,
        pending: state.total_tasks.saturating_sub(resolved),
        success_percent,
        completed,
        failed,
        current_task: state.current_task.clone(),
        start_time: state.start_time.clone(),
        last_update: state.last_update.clone(),
    }
}

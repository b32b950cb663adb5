//! Eligible-task selection over the catalog and progress record.

use crate::io::catalog::{TaskCatalog, TaskSpec};
use crate::io::progress::ExecutionState;

/// Return the first task (in catalog order) that has not reached a terminal
/// state, or `None` when the catalog is exhausted.
pub fn next_eligible<'a>(catalog: &'a TaskCatalog, state: &ExecutionState) -> Option<&'a TaskSpec> {
    catalog.tasks().iter().find(|task| !state.is_terminal(&task.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::outcome::TaskOutcome;
    use crate::test_support::{catalog, task};

    #[test]
    fn selects_first_unresolved_in_catalog_order() {
        let catalog = catalog(vec![task("a", &["true"]), task("b", &["true"])]);
        let mut state = ExecutionState::default();
        state.record_terminal("a", TaskOutcome::Completed);

        let selected = next_eligible(&catalog, &state).expect("eligible task");
        assert_eq!(selected.id, "b");
    }

    #[test]
    fn skips_failed_as_well_as_completed() {
        let catalog = catalog(vec![task("a", &["true"]), task("b", &["true"])]);
        let mut state = ExecutionState::default();
        state.record_terminal("a", TaskOutcome::Failed);

        let selected = next_eligible(&catalog, &state).expect("eligible task");
        assert_eq!(selected.id, "b");
    }

    #[test]
    fn exhausted_catalog_selects_none() {
        let catalog = catalog(vec![task("a", &["true"])]);
        let mut state = ExecutionState::default();
        state.record_terminal("a", TaskOutcome::Completed);

        assert!(next_eligible(&catalog, &state).is_none());
    }
}

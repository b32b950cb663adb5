//! Stable exit codes for drover CLI commands.

/// Command succeeded; for `run`, every task completed.
pub const OK: i32 = 0;
/// Command failed due to an invalid catalog, corrupt progress record, or
/// other engine error.
pub const INVALID: i32 = 1;
/// `run` drained the catalog but at least one task permanently failed.
pub const TASKS_FAILED: i32 = 2;

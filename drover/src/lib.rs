//! Resumable, sequential task execution engine.
//!
//! Drover drains an ordered catalog of declarative tasks against a durable,
//! crash-recoverable progress record: each task runs under a per-attempt
//! timeout, failed attempts retry with increasing backoff, exhausted tasks
//! escalate to a registered one-shot fallback, and the loop only stops when
//! every task has reached a terminal state. The architecture enforces a
//! strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (selection, backoff, outcome
//!   types, summarization). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (catalog/config files, the
//!   progress record, process execution, the execution log). Isolated to
//!   enable mocking in tests.
//!
//! Orchestration modules ([`run`], [`retry`], [`fallback`], [`status`])
//! coordinate core logic with I/O to implement CLI commands.

pub mod core;
pub mod exit_codes;
pub mod fallback;
pub mod io;
pub mod logging;
pub mod retry;
pub mod run;
pub mod status;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

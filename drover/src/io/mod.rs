//! Side-effecting operations: filesystem, process execution, logging.

pub mod catalog;
pub mod config;
pub mod event_log;
pub mod executor;
pub mod paths;
pub mod process;
pub mod progress;

use chrono::{SecondsFormat, Utc};

/// Current time as an RFC 3339 string (second precision, UTC).
pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

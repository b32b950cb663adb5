//! Inter-attempt backoff schedule.

use std::time::Duration;

/// Delay to wait after `completed_attempts` failed attempts, before the next
/// one begins.
///
/// Linear: `completed_attempts * base`. The contract callers rely on is that
/// the schedule is monotonically non-decreasing, not the exact multiplier.
pub fn backoff_delay(completed_attempts: u32, base: Duration) -> Duration {
    base * completed_attempts
}

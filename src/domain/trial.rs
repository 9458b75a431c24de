//! Trial window gating: capture is allowed for 14 days after first launch
//! unless the pro entitlement is set.

pub const TRIAL_WINDOW_MS: i64 = 14 * 24 * 60 * 60 * 1000;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// A non-positive `first_launch_ms` means the window has not been
/// established yet and counts as still-in-trial.
pub fn is_trial_active(first_launch_ms: i64, now_ms: i64) -> bool {
    if first_launch_ms <= 0 {
        return true;
    }
    now_ms - first_launch_ms <= TRIAL_WINDOW_MS
}

pub fn can_capture(is_pro: bool, first_launch_ms: i64, now_ms: i64) -> bool {
    is_pro || is_trial_active(first_launch_ms, now_ms)
}

/// Whole days remaining in the trial, rounded up: a partial day still counts
/// as a full day left.
pub fn days_left(first_launch_ms: i64, now_ms: i64) -> i64 {
    if first_launch_ms <= 0 {
        return 14;
    }
    let elapsed = now_ms - first_launch_ms;
    let remaining = (TRIAL_WINDOW_MS - elapsed).max(0);
    (remaining + DAY_MS - 1) / DAY_MS
}

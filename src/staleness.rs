use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::Path;

use crate::git;

const DAY_SECONDS: f64 = 86_400.0;

/// Whole days between two instants, rounded to nearest. A `then` in the
/// future counts as zero rather than going negative.
pub fn days_between(now: DateTime<Utc>, then: DateTime<Utc>) -> u64 {
    let elapsed = now.signed_duration_since(then).num_seconds() as f64;
    let days = (elapsed / DAY_SECONDS).round();
    if days <= 0.0 {
        0
    } else {
        days as u64
    }
}

/// Days since the last commit in `repo`, per `days_between`.
pub fn elapsed_days(repo: &Path) -> Result<u64> {
    let last = git::last_commit_time(repo)?;
    Ok(days_between(Utc::now(), last))
}

/// The threshold comparison is inclusive: a repository exactly at the
/// configured age already triggers a keepalive.
pub fn is_stale(elapsed_days: u64, threshold_days: u64) -> bool {
    elapsed_days >= threshold_days
}

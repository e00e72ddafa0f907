use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::CheckOptions;
use crate::git;
use crate::staleness;

#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub elapsed_days: u64,
    pub threshold_days: u64,
    pub stale: bool,
    pub last_commit: DateTime<Utc>,
}

/// Read-only staleness report: what `commit` or `api` would decide, without
/// touching anything.
pub fn cmd_check(options: &CheckOptions) -> Result<CheckResult> {
    let last_commit = git::last_commit_time(&options.repo)?;
    let elapsed_days = staleness::days_between(Utc::now(), last_commit);
    Ok(CheckResult {
        elapsed_days,
        threshold_days: options.time_elapsed,
        stale: staleness::is_stale(elapsed_days, options.time_elapsed),
        last_commit,
    })
}

pub fn format_check_human(result: &CheckResult) -> String {
    let verdict = if result.stale {
        "a keepalive would fire"
    } else {
        "nothing to do"
    };
    format!(
        "Last commit {} days ago (threshold {} days): {}",
        result.elapsed_days, result.threshold_days, verdict
    )
}

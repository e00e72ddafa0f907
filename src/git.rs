use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use std::path::Path;

use crate::exec::{self, CommandOutput, ProcessError};

pub fn git(repo: &Path, args: &[&str]) -> Result<String, ProcessError> {
    let output = exec::run("git", args, repo)?;
    Ok(output.stdout.trim_end().to_string())
}

/// For mutating git commands: output streams stay connected to the operator's
/// terminal instead of being captured.
pub fn git_passthrough(repo: &Path, args: &[&str]) -> Result<CommandOutput, ProcessError> {
    exec::run_passthrough("git", args, repo)
}

/// Committer timestamp of the most recent commit on the checked-out branch.
pub fn last_commit_time(repo: &Path) -> Result<DateTime<Utc>> {
    let raw = git(repo, &["--no-pager", "log", "-1", "--format=%ct"])
        .context("failed to read the last commit timestamp")?;
    let seconds: i64 = raw
        .trim()
        .parse()
        .with_context(|| format!("git printed a non-numeric commit timestamp: {:?}", raw))?;
    Utc.timestamp_opt(seconds, 0)
        .single()
        .with_context(|| format!("commit timestamp out of range: {}", seconds))
}

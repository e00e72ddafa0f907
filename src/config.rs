use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::{ApiArgs, CheckArgs, CommitArgs};
use crate::paths::expand_tilde;

pub const DEFAULT_TIME_ELAPSED: u64 = 50;
pub const DEFAULT_COMMIT_MESSAGE: &str = "Automated commit to keep the repository active";

/// Optional defaults file. Everything in it can also be given as a flag;
/// flags win. The token deliberately has no file entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub defaults: Defaults,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default)]
    pub committer_username: Option<String>,
    #[serde(default)]
    pub committer_email: Option<String>,
    #[serde(default)]
    pub commit_message: Option<String>,
    #[serde(default)]
    pub time_elapsed: Option<u64>,
    #[serde(default)]
    pub auto_push: Option<bool>,
    #[serde(default)]
    pub write_check: Option<bool>,
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub workflow_files: Option<String>,
    #[serde(default)]
    pub repo: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CommitOptions {
    pub token: String,
    pub committer_username: String,
    pub committer_email: String,
    pub commit_message: String,
    pub time_elapsed: u64,
    pub auto_push: bool,
    pub write_check: bool,
    pub repo: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ApiOptions {
    pub token: String,
    /// Empty means: only the workflow derived from the run's workflow ref.
    pub workflow_files: Vec<String>,
    /// None means: take the base URL from the environment.
    pub api_base_url: Option<String>,
    pub time_elapsed: u64,
    pub write_check: bool,
    pub repo: PathBuf,
}

#[derive(Debug, Clone)]
pub struct CheckOptions {
    pub time_elapsed: u64,
    pub repo: PathBuf,
}

pub fn default_config_path() -> Result<PathBuf> {
    let proj = directories::ProjectDirs::from("", "", "git-keepalive")
        .context("could not determine config directory")?;
    Ok(proj.config_dir().join("config.toml"))
}

/// Loads the defaults file. An explicit `--config` path must exist; the
/// default location is allowed to be absent.
pub fn load(path_override: Option<&str>) -> Result<ConfigFile> {
    let path = match path_override {
        Some(raw) => {
            let path = expand_tilde(raw);
            if !path.exists() {
                bail!("config file not found at {}", path.display());
            }
            path
        }
        None => {
            let path = default_config_path()?;
            if !path.exists() {
                return Ok(ConfigFile::default());
            }
            path
        }
    };

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config from {}", path.display()))?;
    parse(&contents)
}

pub fn parse(contents: &str) -> Result<ConfigFile> {
    toml::from_str(contents).context("failed to parse config TOML")
}

fn resolve_token(flag: Option<&str>) -> Result<String> {
    if let Some(token) = flag {
        return Ok(token.to_string());
    }
    match std::env::var("GITHUB_TOKEN") {
        Ok(token) if !token.is_empty() => Ok(token),
        _ => bail!("a token is required\nHint: pass --token or set GITHUB_TOKEN"),
    }
}

fn resolve_repo(flag: Option<&str>, defaults: &Defaults) -> PathBuf {
    let raw = flag.or(defaults.repo.as_deref()).unwrap_or(".");
    expand_tilde(raw)
}

fn resolve_threshold(flag: Option<u64>, defaults: &Defaults) -> u64 {
    flag.or(defaults.time_elapsed).unwrap_or(DEFAULT_TIME_ELAPSED)
}

pub fn split_workflow_files(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

pub fn resolve_commit(args: &CommitArgs, file: &ConfigFile) -> Result<CommitOptions> {
    let defaults = &file.defaults;
    let committer_username = args
        .committer_username
        .clone()
        .or_else(|| defaults.committer_username.clone())
        .context("--committer-username is required (or set committer_username in the config file)")?;
    let committer_email = args
        .committer_email
        .clone()
        .or_else(|| defaults.committer_email.clone())
        .context("--committer-email is required (or set committer_email in the config file)")?;

    Ok(CommitOptions {
        token: resolve_token(args.token.as_deref())?,
        committer_username,
        committer_email,
        commit_message: args
            .message
            .clone()
            .or_else(|| defaults.commit_message.clone())
            .unwrap_or_else(|| DEFAULT_COMMIT_MESSAGE.to_string()),
        time_elapsed: resolve_threshold(args.time_elapsed, defaults),
        auto_push: args.auto_push || defaults.auto_push.unwrap_or(false),
        write_check: args.write_check || defaults.write_check.unwrap_or(false),
        repo: resolve_repo(args.repo.as_deref(), defaults),
    })
}

pub fn resolve_api(args: &ApiArgs, file: &ConfigFile) -> Result<ApiOptions> {
    let defaults = &file.defaults;
    let raw_files = args
        .workflow_files
        .clone()
        .or_else(|| defaults.workflow_files.clone())
        .unwrap_or_default();

    Ok(ApiOptions {
        token: resolve_token(args.token.as_deref())?,
        workflow_files: split_workflow_files(&raw_files),
        api_base_url: args
            .api_base_url
            .clone()
            .or_else(|| defaults.api_base_url.clone()),
        time_elapsed: resolve_threshold(args.time_elapsed, defaults),
        write_check: args.write_check || defaults.write_check.unwrap_or(false),
        repo: resolve_repo(args.repo.as_deref(), defaults),
    })
}

pub fn resolve_check(args: &CheckArgs, file: &ConfigFile) -> CheckOptions {
    let defaults = &file.defaults;
    CheckOptions {
        time_elapsed: resolve_threshold(args.time_elapsed, defaults),
        repo: resolve_repo(args.repo.as_deref(), defaults),
    }
}

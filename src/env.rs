use serde::Serialize;
use std::fmt;
use thiserror::Error;

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),
    #[error("GITHUB_REPOSITORY must look like owner/repo, got {0:?}")]
    MalformedRepository(String),
    #[error("no workflow file found in GITHUB_WORKFLOW_REF {0:?} (expected .../<file>@<ref>)")]
    MalformedWorkflowRef(String),
}

/// The slice of the CI environment this tool consumes, read once at startup.
/// Every field is optional here; accessors decide what is required and return
/// a typed error instead of pattern-matching raw strings at the call site.
#[derive(Debug, Clone, Default)]
pub struct ActionsEnv {
    pub repository: Option<String>,
    pub server_url: Option<String>,
    pub api_url: Option<String>,
    pub workflow_ref: Option<String>,
    pub ref_protected: Option<String>,
    pub event_name: Option<String>,
}

impl ActionsEnv {
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            repository: var("GITHUB_REPOSITORY"),
            server_url: var("GITHUB_SERVER_URL"),
            api_url: var("GITHUB_API_URL"),
            workflow_ref: var("GITHUB_WORKFLOW_REF"),
            ref_protected: var("GITHUB_REF_PROTECTED"),
            event_name: var("GITHUB_EVENT_NAME"),
        }
    }

    pub fn repo_slug(&self) -> Result<RepoSlug, EnvError> {
        let raw = self
            .repository
            .as_deref()
            .ok_or(EnvError::Missing("GITHUB_REPOSITORY"))?;
        RepoSlug::parse(raw)
    }

    /// Host part of the server URL, scheme stripped, for embedding in a
    /// remote URL.
    pub fn server_host(&self) -> Result<String, EnvError> {
        let raw = self
            .server_url
            .as_deref()
            .ok_or(EnvError::Missing("GITHUB_SERVER_URL"))?;
        Ok(strip_scheme(raw).trim_end_matches('/').to_string())
    }

    pub fn api_base_url(&self) -> String {
        self.api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
    }

    /// Workflow file of the run that invoked us, derived from the workflow
    /// ref.
    pub fn workflow_file(&self) -> Result<String, EnvError> {
        let raw = self
            .workflow_ref
            .as_deref()
            .ok_or(EnvError::Missing("GITHUB_WORKFLOW_REF"))?;
        workflow_file_from_ref(raw)
    }

    pub fn branch_protected(&self) -> bool {
        self.ref_protected.as_deref() == Some("true")
    }

    pub fn is_pull_request_event(&self) -> bool {
        matches!(
            self.event_name.as_deref(),
            Some("pull_request") | Some("pull_request_target")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoSlug {
    pub owner: String,
    pub repo: String,
}

impl RepoSlug {
    pub fn parse(raw: &str) -> Result<Self, EnvError> {
        match raw.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Ok(Self {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            _ => Err(EnvError::MalformedRepository(raw.to_string())),
        }
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

pub fn strip_scheme(url: &str) -> &str {
    url.strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url)
}

/// Extracts the file name from a workflow ref such as
/// `owner/repo/.github/workflows/ci.yml@refs/heads/main`: the path segment
/// immediately before the `@`.
pub fn workflow_file_from_ref(workflow_ref: &str) -> Result<String, EnvError> {
    let malformed = || EnvError::MalformedWorkflowRef(workflow_ref.to_string());
    let (path, _) = workflow_ref.split_once('@').ok_or_else(malformed)?;
    let file = path.rsplit('/').next().filter(|f| !f.is_empty()).ok_or_else(malformed)?;
    Ok(file.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::EnvGuard;
    use serial_test::serial;

    #[test]
    fn repo_slug_parses_owner_and_repo() {
        let slug = RepoSlug::parse("gkr-bot/test-001").unwrap();
        assert_eq!(slug.owner, "gkr-bot");
        assert_eq!(slug.repo, "test-001");
        assert_eq!(slug.to_string(), "gkr-bot/test-001");
    }

    #[test]
    fn repo_slug_rejects_missing_or_extra_segments() {
        assert!(RepoSlug::parse("just-a-name").is_err());
        assert!(RepoSlug::parse("/repo").is_err());
        assert!(RepoSlug::parse("owner/").is_err());
        assert!(RepoSlug::parse("owner/repo/extra").is_err());
    }

    #[test]
    fn workflow_file_from_canonical_ref() {
        let file = workflow_file_from_ref(
            "gkr-bot/test-001/.github/workflows/blog-post-workflow.yml@refs/heads/main",
        )
        .unwrap();
        assert_eq!(file, "blog-post-workflow.yml");
    }

    #[test]
    fn workflow_file_requires_an_at_separator() {
        let result = workflow_file_from_ref("owner/repo/.github/workflows/ci.yml");
        assert!(result.is_err());
    }

    #[test]
    fn workflow_file_rejects_empty_segment() {
        let result = workflow_file_from_ref("owner/repo/@refs/heads/main");
        assert!(result.is_err());
    }

    #[test]
    fn strip_scheme_handles_both_schemes() {
        assert_eq!(strip_scheme("https://github.com"), "github.com");
        assert_eq!(strip_scheme("http://ghe.internal"), "ghe.internal");
        assert_eq!(strip_scheme("github.com"), "github.com");
    }

    #[test]
    fn server_host_strips_scheme_and_trailing_slash() {
        let env = ActionsEnv {
            server_url: Some("https://ghe.example.com/".to_string()),
            ..Default::default()
        };
        assert_eq!(env.server_host().unwrap(), "ghe.example.com");
    }

    #[test]
    fn api_base_url_falls_back_to_public_github() {
        let env = ActionsEnv::default();
        assert_eq!(env.api_base_url(), DEFAULT_API_BASE_URL);

        let env = ActionsEnv {
            api_url: Some("https://ghe.example.com/api/v3".to_string()),
            ..Default::default()
        };
        assert_eq!(env.api_base_url(), "https://ghe.example.com/api/v3");
    }

    #[test]
    fn branch_protected_only_on_literal_true() {
        let mut env = ActionsEnv::default();
        assert!(!env.branch_protected());
        env.ref_protected = Some("false".to_string());
        assert!(!env.branch_protected());
        env.ref_protected = Some("true".to_string());
        assert!(env.branch_protected());
    }

    #[test]
    #[serial]
    fn from_env_reads_set_variables_and_skips_empty_ones() {
        let _guard = EnvGuard::set(&[
            ("GITHUB_REPOSITORY", Some("octo/widgets")),
            ("GITHUB_SERVER_URL", Some("https://github.com")),
            ("GITHUB_API_URL", Some("")),
            ("GITHUB_WORKFLOW_REF", None),
            ("GITHUB_REF_PROTECTED", None),
            ("GITHUB_EVENT_NAME", Some("schedule")),
        ]);

        let env = ActionsEnv::from_env();
        assert_eq!(env.repository.as_deref(), Some("octo/widgets"));
        assert_eq!(env.server_url.as_deref(), Some("https://github.com"));
        assert_eq!(env.api_url, None, "empty variables count as unset");
        assert_eq!(env.workflow_ref, None);
        assert_eq!(env.event_name.as_deref(), Some("schedule"));
    }
}

use thiserror::Error;
use ureq::Agent;

use crate::env::RepoSlug;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("enable workflow returned status {status} (expected 204): {}", .body.trim())]
    UnexpectedStatus { status: u16, body: String },
    #[error("enable workflow request failed: {0}")]
    Transport(#[from] ureq::Error),
}

/// Minimal client for the one endpoint this tool needs:
/// `PUT /repos/{owner}/{repo}/actions/workflows/{workflow}/enable`.
pub struct Client {
    agent: Agent,
    base_url: String,
    token: String,
}

fn enable_url(base_url: &str, slug: &RepoSlug, workflow_file: &str) -> String {
    format!(
        "{}/repos/{}/{}/actions/workflows/{}/enable",
        base_url.trim_end_matches('/'),
        slug.owner,
        slug.repo,
        workflow_file
    )
}

impl Client {
    pub fn new(token: &str, base_url: &str) -> Self {
        // Non-2xx statuses come back as responses, not transport errors, so
        // the 204 contract below can inspect them.
        let config = Agent::config_builder()
            .http_status_as_error(false)
            .build();
        let agent: Agent = config.into();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    /// Re-enables a workflow that the platform disabled for inactivity.
    /// Success is exactly a 204 response; anything else surfaces with the raw
    /// response body attached.
    pub fn enable_workflow(&self, slug: &RepoSlug, workflow_file: &str) -> Result<(), ApiError> {
        let url = enable_url(&self.base_url, slug, workflow_file);
        let mut response = self
            .agent
            .put(&url)
            .header("Authorization", &format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header(
                "User-Agent",
                concat!("git-keepalive/", env!("CARGO_PKG_VERSION")),
            )
            .send_empty()?;

        let status = response.status().as_u16();
        if status != 204 {
            let body = response.body_mut().read_to_string().unwrap_or_default();
            return Err(ApiError::UnexpectedStatus { status, body });
        }
        Ok(())
    }
}

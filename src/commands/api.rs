use anyhow::Result;
use serde::Serialize;

use crate::config::ApiOptions;
use crate::env::{ActionsEnv, RepoSlug};
use crate::github::Client;
use crate::guard::{self, GuardDecision, GuardRejected};
use crate::staleness;

/// Placeholder name for the workflow this run belongs to when its file name
/// could not be derived.
const PARENT_WORKFLOW_LABEL: &str = "<current workflow>";

#[derive(Debug, Serialize)]
pub struct ApiResult {
    /// None when the guard short-circuited before the repository was read.
    pub elapsed_days: Option<u64>,
    pub threshold_days: u64,
    pub outcome: ApiOutcome,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum ApiOutcome {
    NothingToDo { message: String },
    Enabled { workflows: Vec<WorkflowOutcome> },
}

#[derive(Debug, Serialize)]
pub struct WorkflowOutcome {
    pub workflow: String,
    pub ok: bool,
    pub error: Option<String>,
}

impl ApiResult {
    /// True when any individual enable call failed; the process must then
    /// exit non-zero even though every call was attempted.
    pub fn failed(&self) -> bool {
        match &self.outcome {
            ApiOutcome::NothingToDo { .. } => false,
            ApiOutcome::Enabled { workflows } => workflows.iter().any(|w| !w.ok),
        }
    }
}

pub fn cmd_api(options: &ApiOptions, env: &ActionsEnv) -> Result<ApiResult> {
    match guard::evaluate(options.write_check, env) {
        GuardDecision::Reject(reason) => return Err(GuardRejected(reason).into()),
        GuardDecision::ShortCircuit(message) => {
            return Ok(ApiResult {
                elapsed_days: None,
                threshold_days: options.time_elapsed,
                outcome: ApiOutcome::NothingToDo { message },
            })
        }
        GuardDecision::Proceed => {}
    }

    let elapsed = staleness::elapsed_days(&options.repo)?;
    if !staleness::is_stale(elapsed, options.time_elapsed) {
        return Ok(ApiResult {
            elapsed_days: Some(elapsed),
            threshold_days: options.time_elapsed,
            outcome: ApiOutcome::NothingToDo {
                message: "Nothing to do...".to_string(),
            },
        });
    }

    let slug = env.repo_slug()?;
    let base_url = options
        .api_base_url
        .clone()
        .unwrap_or_else(|| env.api_base_url());

    // The configured list is always extended with the workflow this run
    // belongs to, so the parent never goes stale either. When only the parent
    // is wanted and it cannot be derived, that is fatal; with an explicit
    // list the remaining workflows still get their chance.
    let mut targets = options.workflow_files.clone();
    let mut undeliverable: Option<WorkflowOutcome> = None;
    match env.workflow_file() {
        Ok(parent) => {
            if !targets.contains(&parent) {
                targets.push(parent);
            }
        }
        Err(err) => {
            if targets.is_empty() {
                return Err(err.into());
            }
            undeliverable = Some(WorkflowOutcome {
                workflow: PARENT_WORKFLOW_LABEL.to_string(),
                ok: false,
                error: Some(err.to_string()),
            });
        }
    }

    eprintln!(
        "Last commit was {} days ago (threshold {}), re-enabling {} workflow(s)",
        elapsed,
        options.time_elapsed,
        targets.len()
    );

    let client = Client::new(&options.token, &base_url);
    let mut workflows = enable_all(&client, &slug, &targets);
    if let Some(outcome) = undeliverable {
        workflows.push(outcome);
    }

    for outcome in &workflows {
        match &outcome.error {
            None => eprintln!("enabled {}", outcome.workflow),
            Some(err) => eprintln!("failed to enable {}: {}", outcome.workflow, err),
        }
    }

    Ok(ApiResult {
        elapsed_days: Some(elapsed),
        threshold_days: options.time_elapsed,
        outcome: ApiOutcome::Enabled { workflows },
    })
}

/// Every workflow gets its own thread and its own failure domain: one call
/// failing neither cancels nor blocks the others, and all of them settle
/// before the outcomes are aggregated.
fn enable_all(client: &Client, slug: &RepoSlug, targets: &[String]) -> Vec<WorkflowOutcome> {
    std::thread::scope(|scope| {
        let handles: Vec<_> = targets
            .iter()
            .map(|workflow| {
                let workflow = workflow.clone();
                scope.spawn(move || match client.enable_workflow(slug, &workflow) {
                    Ok(()) => WorkflowOutcome {
                        workflow,
                        ok: true,
                        error: None,
                    },
                    Err(err) => WorkflowOutcome {
                        workflow,
                        ok: false,
                        error: Some(err.to_string()),
                    },
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle.join().unwrap_or_else(|_| WorkflowOutcome {
                    workflow: PARENT_WORKFLOW_LABEL.to_string(),
                    ok: false,
                    error: Some("enable-workflow worker panicked".to_string()),
                })
            })
            .collect()
    })
}

pub fn format_api_human(result: &ApiResult) -> String {
    match &result.outcome {
        ApiOutcome::NothingToDo { message } => message.clone(),
        ApiOutcome::Enabled { workflows } => {
            let mut lines = Vec::new();
            for outcome in workflows {
                match &outcome.error {
                    None => lines.push(format!("  enabled  {}", outcome.workflow)),
                    Some(err) => lines.push(format!("  failed   {}: {}", outcome.workflow, err)),
                }
            }
            let failed = workflows.iter().filter(|w| !w.ok).count();
            if failed == 0 {
                lines.push("Kept the repository active using the GitHub API...".to_string());
            } else {
                lines.push(format!(
                    "Failed to enable {} of {} workflow(s)",
                    failed,
                    workflows.len()
                ));
            }
            lines.join("\n")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{StubApi, TestEnv};
    use std::path::PathBuf;

    fn options(repo: PathBuf, base_url: Option<String>) -> ApiOptions {
        ApiOptions {
            token: "t0ken".to_string(),
            workflow_files: Vec::new(),
            api_base_url: base_url,
            time_elapsed: 50,
            write_check: false,
            repo,
        }
    }

    fn actions_env() -> ActionsEnv {
        ActionsEnv {
            repository: Some("octo/widgets".to_string()),
            workflow_ref: Some(
                "octo/widgets/.github/workflows/parent.yml@refs/heads/main".to_string(),
            ),
            ..Default::default()
        }
    }

    #[test]
    fn fresh_repo_resolves_nothing_to_do() {
        let env = TestEnv::new();
        let repo = env.create_repo("fresh");
        let result = cmd_api(&options(repo, None), &actions_env()).unwrap();
        assert_eq!(result.elapsed_days, Some(0));
        assert!(!result.failed());
        assert!(matches!(result.outcome, ApiOutcome::NothingToDo { .. }));
    }

    #[test]
    fn guard_reject_aborts_before_any_call() {
        let env = TestEnv::new();
        let repo = env.create_repo_last_commit_days_ago("stale", 60);
        let mut opts = options(repo, None);
        opts.write_check = true;
        let actions_env = ActionsEnv {
            ref_protected: Some("true".to_string()),
            ..actions_env()
        };

        let result = cmd_api(&opts, &actions_env);
        assert!(result.unwrap_err().to_string().contains("protected"));
    }

    #[test]
    fn pull_request_event_short_circuits() {
        let env = TestEnv::new();
        let repo = env.create_repo_last_commit_days_ago("stale", 60);
        let mut opts = options(repo, None);
        opts.write_check = true;
        let actions_env = ActionsEnv {
            event_name: Some("pull_request".to_string()),
            ..actions_env()
        };

        let result = cmd_api(&opts, &actions_env).unwrap();
        assert!(matches!(result.outcome, ApiOutcome::NothingToDo { .. }));
    }

    #[test]
    fn single_workflow_derived_from_the_run_ref() {
        let env = TestEnv::new();
        let repo = env.create_repo_last_commit_days_ago("stale", 60);
        let stub = StubApi::start(1);
        let result = cmd_api(
            &options(repo, Some(stub.base_url())),
            &actions_env(),
        )
        .unwrap();

        assert!(!result.failed());
        let requests = stub.finish();
        assert_eq!(requests.len(), 1);
        assert!(
            requests[0]
                .starts_with("PUT /repos/octo/widgets/actions/workflows/parent.yml/enable"),
            "unexpected request line: {}",
            requests[0]
        );
    }

    #[test]
    fn multi_workflow_partial_failure_settles_all_and_reports_failure() {
        let env = TestEnv::new();
        let repo = env.create_repo_last_commit_days_ago("stale", 60);
        let stub = StubApi::start(3);
        let mut opts = options(repo, Some(stub.base_url()));
        opts.workflow_files = vec!["ci.yml".to_string(), "broken.yml".to_string()];

        let result = cmd_api(&opts, &actions_env()).unwrap();
        assert!(result.failed());

        let workflows = match &result.outcome {
            ApiOutcome::Enabled { workflows } => workflows,
            other => panic!("expected Enabled, got {:?}", other),
        };
        assert_eq!(workflows.len(), 3);
        let by_name = |name: &str| {
            workflows
                .iter()
                .find(|w| w.workflow == name)
                .unwrap_or_else(|| panic!("missing outcome for {}", name))
        };
        assert!(by_name("ci.yml").ok);
        assert!(by_name("parent.yml").ok);
        assert!(!by_name("broken.yml").ok);
        assert!(by_name("broken.yml").error.as_deref().unwrap().contains("500"));

        let requests = stub.finish();
        assert_eq!(requests.len(), 3);
        for workflow in ["ci.yml", "broken.yml", "parent.yml"] {
            assert!(
                requests.iter().any(|r| r.contains(workflow)),
                "no request seen for {}",
                workflow
            );
        }

        let human = format_api_human(&result);
        assert!(human.contains("ci.yml"));
        assert!(human.contains("broken.yml"));
        assert!(human.contains("parent.yml"));
        assert!(human.contains("Failed to enable 1 of 3"));
    }

    #[test]
    fn parent_workflow_is_not_duplicated_when_listed() {
        let env = TestEnv::new();
        let repo = env.create_repo_last_commit_days_ago("stale", 60);
        let stub = StubApi::start(2);
        let mut opts = options(repo, Some(stub.base_url()));
        opts.workflow_files = vec!["ci.yml".to_string(), "parent.yml".to_string()];

        let result = cmd_api(&opts, &actions_env()).unwrap();
        assert!(!result.failed());
        assert_eq!(stub.finish().len(), 2);
    }

    #[test]
    fn missing_workflow_ref_is_fatal_without_a_list() {
        let env = TestEnv::new();
        let repo = env.create_repo_last_commit_days_ago("stale", 60);
        let actions_env = ActionsEnv {
            workflow_ref: None,
            ..actions_env()
        };

        let result = cmd_api(&options(repo, None), &actions_env);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("GITHUB_WORKFLOW_REF"));
    }

    #[test]
    fn missing_workflow_ref_with_a_list_still_serves_the_list() {
        let env = TestEnv::new();
        let repo = env.create_repo_last_commit_days_ago("stale", 60);
        let stub = StubApi::start(1);
        let mut opts = options(repo, Some(stub.base_url()));
        opts.workflow_files = vec!["ci.yml".to_string()];
        let actions_env = ActionsEnv {
            workflow_ref: None,
            ..actions_env()
        };

        let result = cmd_api(&opts, &actions_env).unwrap();
        assert!(result.failed(), "the underivable parent counts as a failure");

        let workflows = match &result.outcome {
            ApiOutcome::Enabled { workflows } => workflows,
            other => panic!("expected Enabled, got {:?}", other),
        };
        assert_eq!(workflows.len(), 2);
        assert!(workflows.iter().any(|w| w.workflow == "ci.yml" && w.ok));
        assert!(workflows
            .iter()
            .any(|w| w.workflow == PARENT_WORKFLOW_LABEL && !w.ok));
        stub.finish();
    }
}

use thiserror::Error;

use crate::env::ActionsEnv;

/// Pre-flight write check, decided before any mutating action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    /// Hard stop: the run must abort without touching anything.
    Reject(String),
    /// Nothing to do: the run resolves successfully without touching anything.
    ShortCircuit(String),
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct GuardRejected(pub String);

pub fn evaluate(enabled: bool, env: &ActionsEnv) -> GuardDecision {
    if !enabled {
        return GuardDecision::Proceed;
    }
    if env.branch_protected() {
        return GuardDecision::Reject(
            "the target branch is protected, so this token cannot write to it; \
             remove the branch protection rule or drop --write-check"
                .to_string(),
        );
    }
    if env.is_pull_request_event() {
        return GuardDecision::ShortCircuit("Nothing to do...".to_string());
    }
    GuardDecision::Proceed
}

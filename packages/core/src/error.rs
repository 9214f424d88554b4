//! The typed error taxonomy every Orchestrator operation surfaces, each
//! variant carrying a stable identity for matching plus a human-facing
//! message. Rendering a `Details:`/`Hint:` tail for display is the CLI
//! crate's job (`stet_cli::report`), not this type's.

use stet_git_models::GitOpsError;
use stet_llm::LlmError;
use stet_session::SessionStoreError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("no review session in progress; run `stet start <ref>` first")]
    NoSession,

    #[error("session is already locked by another process")]
    SessionLocked,

    #[error("the working tree has uncommitted changes")]
    DirtyWorktree,

    #[error("a baseline worktree already exists at {0}")]
    WorktreeExists(String),

    #[error("{baseline} is not an ancestor of {head}")]
    BaselineNotAncestor { baseline: String, head: String },

    #[error("could not resolve baseline ref {requested:?}: {reason}")]
    BaselineRefUnresolvable {
        requested: String,
        reason: String,
        shallow_hint: bool,
    },

    #[error("could not reach the LLM server: {0}")]
    LlmUnreachable(String),

    #[error("LLM server rejected the request: {0}")]
    LlmBadRequest(String),

    #[error("model {0:?} is not present on the LLM server")]
    LlmModelAbsent(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Exit code convention at the CLI boundary (spec.md §6): 0 success is
    /// implicit (no error), 1 operational error, 2 LLM transport error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::LlmUnreachable(_) | Self::LlmBadRequest(_) => 2,
            _ => 1,
        }
    }

    /// A recovery hint to print on a `Hint:` line, when one applies.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::DirtyWorktree => Some(
                "Commit or stash your changes, or pass --allow-dirty to review anyway."
                    .to_string(),
            ),
            Self::WorktreeExists(_) => {
                Some("Run `stet finish` to clean up the previous session first.".to_string())
            }
            Self::BaselineRefUnresolvable {
                shallow_hint: true, ..
            } => Some(
                "This looks like a shallow clone; pass a concrete commit SHA instead of a relative ref."
                    .to_string(),
            ),
            Self::LlmModelAbsent(model) => Some(format!("Pull the model first: ollama pull {model}")),
            Self::LlmUnreachable(_) => {
                Some("Is the LLM server running and reachable at the configured URL?".to_string())
            }
            _ => None,
        }
    }
}

impl From<GitOpsError> for CoreError {
    fn from(err: GitOpsError) -> Self {
        match err {
            GitOpsError::NotAnAncestor { baseline, head } => {
                Self::BaselineNotAncestor { baseline, head }
            }
            GitOpsError::RefUnresolvable {
                requested,
                reason,
                shallow_hint,
            } => Self::BaselineRefUnresolvable {
                requested,
                reason,
                shallow_hint,
            },
            GitOpsError::WorktreeExists(path) => Self::WorktreeExists(path),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<LlmError> for CoreError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Unreachable(reason) => Self::LlmUnreachable(reason),
            LlmError::BadRequest(reason) => Self::LlmBadRequest(reason),
            LlmError::ModelAbsent(model) => Self::LlmModelAbsent(model),
            LlmError::Timeout => Self::Internal("LLM call canceled".to_string()),
            LlmError::Generic(reason) => Self::Internal(reason),
        }
    }
}

impl From<SessionStoreError> for CoreError {
    fn from(err: SessionStoreError) -> Self {
        match err {
            SessionStoreError::AlreadyLocked(_) => Self::SessionLocked,
            other => Self::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llm_transport_errors_exit_two() {
        assert_eq!(CoreError::LlmUnreachable("x".to_string()).exit_code(), 2);
        assert_eq!(CoreError::LlmBadRequest("x".to_string()).exit_code(), 2);
    }

    #[test]
    fn operational_errors_exit_one() {
        assert_eq!(CoreError::NoSession.exit_code(), 1);
        assert_eq!(CoreError::SessionLocked.exit_code(), 1);
    }

    #[test]
    fn dirty_worktree_hint_contains_commit_or_stash() {
        let hint = CoreError::DirtyWorktree.hint().unwrap();
        assert!(hint.contains("Commit or stash"));
    }

    #[test]
    fn worktree_exists_hint_contains_stet_finish() {
        let hint = CoreError::WorktreeExists("x".to_string()).hint().unwrap();
        assert!(hint.contains("stet finish"));
    }
}

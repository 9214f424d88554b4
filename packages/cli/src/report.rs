//! Renders a [`CoreError`] as the user-visible failure shape from the
//! error handling design: a one-line cause, an optional `Details:` line
//! with the unwrapped underlying error, and an optional `Hint:` line.
//!
//! This is deliberately a CLI-only concern — `CoreError` itself carries
//! no notion of a terminal-shaped rendering, so a future embedder could
//! render the same error differently.

use stet_core::CoreError;

#[must_use]
pub fn render(err: &CoreError) -> String {
    let (cause, details) = describe(err);
    let mut out = format!("error: {cause}");
    if let Some(details) = details {
        out.push_str(&format!("\nDetails: {details}"));
    }
    if let Some(hint) = err.hint() {
        out.push_str(&format!("\nHint: {hint}"));
    }
    out
}

fn describe(err: &CoreError) -> (String, Option<String>) {
    match err {
        CoreError::NoSession => (
            "no review session in progress; run `stet start <ref>` first".to_string(),
            None,
        ),
        CoreError::SessionLocked => (
            "session is already locked by another process".to_string(),
            None,
        ),
        CoreError::DirtyWorktree => (
            "the working tree has uncommitted changes".to_string(),
            None,
        ),
        CoreError::WorktreeExists(path) => (
            "a baseline worktree already exists".to_string(),
            Some(path.clone()),
        ),
        CoreError::BaselineNotAncestor { baseline, head } => (
            "the requested baseline is not an ancestor of HEAD".to_string(),
            Some(format!("{baseline} is not an ancestor of {head}")),
        ),
        CoreError::BaselineRefUnresolvable {
            requested, reason, ..
        } => (
            format!("could not resolve baseline ref {requested:?}"),
            Some(reason.clone()),
        ),
        CoreError::LlmUnreachable(reason) => (
            "could not reach the LLM server".to_string(),
            Some(reason.clone()),
        ),
        CoreError::LlmBadRequest(reason) => (
            "the LLM server rejected the request".to_string(),
            Some(reason.clone()),
        ),
        CoreError::LlmModelAbsent(model) => (
            format!("model {model:?} is not present on the LLM server"),
            None,
        ),
        CoreError::InvalidInput(message) => ("invalid input".to_string(), Some(message.clone())),
        CoreError::Internal(message) => ("internal error".to_string(), Some(message.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dirty_worktree_renders_cause_and_hint_without_details() {
        let text = render(&CoreError::DirtyWorktree);
        assert!(text.contains("error: the working tree has uncommitted changes"));
        assert!(text.contains("Hint: Commit or stash"));
        assert!(!text.contains("Details:"));
    }

    #[test]
    fn llm_unreachable_renders_details_and_hint() {
        let text = render(&CoreError::LlmUnreachable("connection refused".to_string()));
        assert!(text.contains("Details: connection refused"));
        assert!(text.contains("Hint:"));
    }
}

//! Drop findings whose id has already been dismissed in an earlier session.
//!
//! This is what prevents a dismissed finding from resurfacing across
//! `run`/`rerun` invocations. The set of previously-dismissed ids is
//! assembled by the caller (from the session's `dismissed_ids` and/or the
//! history log) so this crate never has to depend on `stet_session`.

use std::collections::HashSet;

use stet_findings_models::Finding;

/// Drop every finding whose id is in `dismissed_ids`.
#[must_use]
pub fn suppress(findings: Vec<Finding>, dismissed_ids: &HashSet<String>) -> Vec<Finding> {
    findings
        .into_iter()
        .filter(|f| !dismissed_ids.contains(&f.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use stet_findings_models::{Category, Severity};

    use super::*;

    fn finding(message: &str) -> Finding {
        Finding::new(
            "a.rs".to_string(),
            1,
            None,
            Severity::Warning,
            Category::Bug,
            0.9,
            message.to_string(),
            None,
        )
    }

    #[test]
    fn drops_a_previously_dismissed_id() {
        let kept = finding("keep me");
        let dismissed = finding("dismiss me");
        let mut ids = HashSet::new();
        ids.insert(dismissed.id.clone());

        let result = suppress(vec![kept.clone(), dismissed], &ids);
        assert_eq!(result, vec![kept]);
    }

    #[test]
    fn empty_dismissed_set_keeps_everything() {
        let a = finding("a");
        let b = finding("b");
        let result = suppress(vec![a.clone(), b.clone()], &HashSet::new());
        assert_eq!(result, vec![a, b]);
    }
}

//! Combine a freshly-produced batch of findings with a session's existing
//! findings, deduping by id.
//!
//! Because a finding's id is content-addressed (see
//! `stet_findings_models::fingerprint`), two findings with the same id are
//! identical by construction — "merging" never has to reconcile conflicting
//! field values, only decide which ids are present in the result.

use std::collections::HashSet;

use stet_findings_models::Finding;

/// How a fresh batch is combined with the session's existing findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Keep every existing finding and add any new ids from the fresh
    /// batch. Used by `run`'s partial sweep.
    Union,
    /// Drop every existing finding whose id is in `replaced_ids` before
    /// unioning with the fresh batch. Used by `rerun`, where the caller
    /// passes the ids attached to the hunks this run covered (the
    /// orchestrator tracks that association; this crate only sees ids).
    Replace,
}

/// Merge `fresh` into `existing` per `mode`.
///
/// For any session `S` and batch `B`, the postcondition
/// `ids(result) == ids(S) ∪ ids(B)` holds under [`MergeMode::Union`]; under
/// [`MergeMode::Replace`] it holds with `ids(S) \ replaced_ids` in place of
/// `ids(S)`.
#[must_use]
pub fn merge(
    existing: Vec<Finding>,
    fresh: Vec<Finding>,
    mode: MergeMode,
    replaced_ids: &HashSet<String>,
) -> Vec<Finding> {
    let mut seen = HashSet::new();
    let mut result = Vec::with_capacity(existing.len() + fresh.len());

    let surviving_existing = existing.into_iter().filter(|f| match mode {
        MergeMode::Union => true,
        MergeMode::Replace => !replaced_ids.contains(&f.id),
    });

    for finding in surviving_existing.chain(fresh) {
        if seen.insert(finding.id.clone()) {
            result.push(finding);
        }
    }
    result
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
    fn union_keeps_existing_and_adds_new() {
        let existing = finding("existing");
        let fresh = finding("new");
        let result = merge(
            vec![existing.clone()],
            vec![fresh.clone()],
            MergeMode::Union,
            &HashSet::new(),
        );
        assert_eq!(result.len(), 2);
        assert!(result.contains(&existing));
        assert!(result.contains(&fresh));
    }

    #[test]
    fn union_is_idempotent_on_identical_ids() {
        let f = finding("same content");
        let result = merge(vec![f.clone()], vec![f.clone()], MergeMode::Union, &HashSet::new());
        assert_eq!(result, vec![f]);
    }

    #[test]
    fn replace_drops_only_ids_in_scope() {
        let kept = finding("outside this run's hunks");
        let replaced = finding("inside this run's hunks, now gone");
        let fresh = finding("fresh replacement");

        let mut replaced_ids = HashSet::new();
        replaced_ids.insert(replaced.id.clone());

        let result = merge(
            vec![kept.clone(), replaced],
            vec![fresh.clone()],
            MergeMode::Replace,
            &replaced_ids,
        );
        assert_eq!(result.len(), 2);
        assert!(result.contains(&kept));
        assert!(result.contains(&fresh));
    }
}

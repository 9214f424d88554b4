#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Persistent per-repository review state.
//!
//! A [`Session`] exists iff its `baseline_ref` is non-empty: it is created
//! by `start`, mutated by `run`/`rerun`/`dismiss`, and destroyed by
//! `finish`. Everything here is a plain data model; reading and writing it
//! to disk is `stet_session`'s job, not this crate's.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stet_findings_models::Finding;

/// Effective configuration a session was started or last run with, so that
/// `run` after `start` reuses the parameters the user committed to unless
/// explicitly overridden.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub strictness: String,
    pub nitpicky: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rag_symbol_max_definitions: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rag_symbol_max_tokens: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_ctx: Option<u32>,
}

impl Default for ConfigSnapshot {
    fn default() -> Self {
        Self {
            strictness: "default".to_string(),
            nitpicky: false,
            rag_symbol_max_definitions: None,
            rag_symbol_max_tokens: None,
            context_limit: None,
            num_ctx: None,
        }
    }
}

/// What a hunk's prompt looked like and what the model said about it, kept
/// for the most recent run only so `status` can show it without re-running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptShadow {
    pub hunk_fingerprint: String,
    pub file: String,
    pub prompt: String,
    /// Truncated copy of the raw model response (pre-parse), bounded so the
    /// session document does not grow unboundedly on verbose models.
    pub raw_response_excerpt: String,
}

/// Persistent per-repository state of an in-progress review.
///
/// Invariant: a session exists iff `baseline_ref` is non-empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub baseline_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub findings: Vec<Finding>,
    #[serde(default)]
    pub dismissed_ids: Vec<String>,
    /// Finding id -> the exact context block its hunk was reviewed with.
    #[serde(default)]
    pub finding_prompt_context: HashMap<String, String>,
    /// Hunk fingerprints already folded into `findings` at least once, so
    /// `run` can partition to-review vs already-reviewed hunks.
    #[serde(default)]
    pub reviewed_fingerprints: Vec<String>,
    #[serde(default)]
    pub prompt_shadows: Vec<PromptShadow>,
    #[serde(default)]
    pub config: ConfigSnapshot,
}

impl Session {
    /// A session that does not yet exist on disk.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether this session has actually been started.
    #[must_use]
    pub fn exists(&self) -> bool {
        !self.baseline_ref.is_empty()
    }

    /// Findings visible to the user: everything not dismissed.
    #[must_use]
    pub fn active_findings(&self) -> Vec<&Finding> {
        self.findings
            .iter()
            .filter(|f| !self.dismissed_ids.iter().any(|id| id == &f.id))
            .collect()
    }

    /// Resolve a short hex prefix to exactly one finding id.
    ///
    /// # Errors
    ///
    /// Returns `Err` with the list of ambiguous matches if more than one
    /// id shares the prefix, or an empty `Vec` if none do.
    pub fn resolve_id_prefix(&self, prefix: &str) -> Result<String, Vec<String>> {
        let matches: Vec<String> = self
            .findings
            .iter()
            .map(|f| f.id.clone())
            .filter(|id| id.starts_with(prefix))
            .collect();
        match matches.len() {
            1 => Ok(matches.into_iter().next().unwrap()),
            _ => Err(matches),
        }
    }
}

/// A summary view of a session for the `status` operation, distinct from
/// the raw persisted [`Session`] so callers are not coupled to on-disk shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub baseline_ref: String,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub active_finding_count: usize,
    pub dismissed_count: usize,
    pub config: ConfigSnapshot,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            baseline_ref: session.baseline_ref.clone(),
            last_reviewed_at: session.last_reviewed_at,
            active_finding_count: session.active_findings().len(),
            dismissed_count: session.dismissed_ids.len(),
            config: session.config.clone(),
        }
    }
}

/// Why a finding was dismissed, recorded verbatim in the history log.
pub type DismissReason = Option<String>;

/// An append-only log entry recorded every time findings are dismissed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub timestamp: DateTime<Utc>,
    pub baseline_ref: String,
    /// The ids dismissed in this action, paired with their reason.
    pub dismissed: Vec<(String, DismissReason)>,
    /// The full finding payload at the time of dismissal, so a later audit
    /// can see exactly what was dismissed without depending on `findings`
    /// still existing in a future session.
    pub findings: Vec<Finding>,
    pub config: ConfigSnapshot,
}

#[cfg(test)]
mod tests {
    use stet_findings_models::{Category, Severity};

    use super::*;

    fn sample_finding(message: &str) -> Finding {
        Finding::new(
            "src/lib.rs".to_string(),
            10,
            None,
            Severity::Warning,
            Category::Bug,
            0.8,
            message.to_string(),
            None,
        )
    }

    #[test]
    fn empty_session_does_not_exist() {
        assert!(!Session::empty().exists());
    }

    #[test]
    fn session_with_baseline_exists() {
        let session = Session {
            baseline_ref: "abc123".to_string(),
            ..Session::empty()
        };
        assert!(session.exists());
    }

    #[test]
    fn active_findings_excludes_dismissed() {
        let finding = sample_finding("a bug");
        let session = Session {
            baseline_ref: "abc".to_string(),
            dismissed_ids: vec![finding.id.clone()],
            findings: vec![finding],
            ..Session::empty()
        };
        assert!(session.active_findings().is_empty());
    }

    #[test]
    fn resolve_id_prefix_finds_unique_match() {
        let finding = sample_finding("unique one");
        let prefix = finding.id[..7].to_string();
        let session = Session {
            baseline_ref: "abc".to_string(),
            findings: vec![finding.clone()],
            ..Session::empty()
        };
        assert_eq!(session.resolve_id_prefix(&prefix), Ok(finding.id));
    }

    #[test]
    fn resolve_id_prefix_reports_ambiguity() {
        let a = sample_finding("finding a");
        let b = sample_finding("finding b");
        // Force a shared prefix regardless of real hash values.
        let shared = "deadbeef";
        let mut a = a;
        let mut b = b;
        a.id = format!("{shared}1111");
        b.id = format!("{shared}2222");
        let session = Session {
            baseline_ref: "abc".to_string(),
            findings: vec![a, b],
            ..Session::empty()
        };
        let err = session.resolve_id_prefix(shared).unwrap_err();
        assert_eq!(err.len(), 2);
    }
}

//! Compose parse → validate → strictness → kill-list into the per-hunk
//! pipeline stage. Suppression and merge happen afterward, once per run
//! rather than once per hunk, since both need the whole session's state.

use std::collections::HashSet;

use stet_findings_models::Finding;

use crate::{kill_list, parser, strictness::StrictnessParams, validate};

/// Result of running one model response through the per-hunk pipeline.
#[derive(Debug, Default)]
pub struct PipelineOutcome {
    pub findings: Vec<Finding>,
    pub warnings: Vec<String>,
}

/// Parse `raw_response`, validate each candidate, drop anything below
/// `strictness`'s confidence bar, drop kill-listed messages unless
/// `nitpicky`, and dedupe by id within this single response.
///
/// A parse failure contributes zero findings and one warning rather than
/// aborting — per-hunk LLM output is never allowed to fail the whole run.
#[must_use]
pub fn run_pipeline(raw_response: &str, strictness: StrictnessParams, nitpicky: bool) -> PipelineOutcome {
    let raw = match parser::parse_findings(raw_response) {
        Ok(raw) => raw,
        Err(e) => {
            return PipelineOutcome {
                findings: Vec::new(),
                warnings: vec![format!("could not parse model response: {e}")],
            };
        }
    };

    let (validated, mut warnings) = validate::validate(raw);

    let mut seen = HashSet::new();
    let findings = validated
        .into_iter()
        .filter(|f| strictness.keeps(f))
        .filter(|f| nitpicky || !kill_list::is_low_signal(&f.message))
        .filter(|f| seen.insert(f.id.clone()))
        .collect();

    warnings.retain(|w| !w.is_empty());
    PipelineOutcome {
        findings,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use crate::strictness::StrictnessPreset;

    use super::*;

    #[test]
    fn malformed_response_yields_zero_findings_and_a_warning() {
        let outcome = run_pipeline("not json", StrictnessPreset::Default.params(), false);
        assert!(outcome.findings.is_empty());
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[test]
    fn low_confidence_finding_is_dropped_by_strictness() {
        let raw = r#"{"findings":[{"file":"a.rs","line":1,"severity":"warning","category":"bug","confidence":0.1,"message":"maybe a bug"}]}"#;
        let outcome = run_pipeline(raw, StrictnessPreset::Strict.params(), false);
        assert!(outcome.findings.is_empty());
    }

    #[test]
    fn kill_listed_message_is_dropped_unless_nitpicky() {
        let raw = r#"{"findings":[{"file":"a.rs","line":1,"severity":"info","category":"style","confidence":0.99,"message":"consider adding a comment here"}]}"#;
        let strict = StrictnessPreset::Lenient.params();
        let filtered = run_pipeline(raw, strict, false);
        assert!(filtered.findings.is_empty());

        let kept = run_pipeline(raw, strict, true);
        assert_eq!(kept.findings.len(), 1);
    }

    #[test]
    fn duplicate_ids_within_one_response_are_deduped() {
        let raw = r#"{"findings":[
            {"file":"a.rs","line":1,"severity":"warning","category":"bug","confidence":0.9,"message":"same bug"},
            {"file":"a.rs","line":1,"severity":"warning","category":"bug","confidence":0.9,"message":"same bug"}
        ]}"#;
        let outcome = run_pipeline(raw, StrictnessPreset::Lenient.params(), false);
        assert_eq!(outcome.findings.len(), 1);
    }
}

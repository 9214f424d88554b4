//! Resolves a named strictness preset to the three parameters the
//! findings pipeline filters on.

use stet_findings_models::{Category, Finding};

/// A named strictness preset, each with a `+` variant that is stricter
/// within the same tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrictnessPreset {
    Strict,
    StrictPlus,
    Default,
    DefaultPlus,
    Lenient,
    LenientPlus,
}

impl StrictnessPreset {
    /// Parse the CLI/config spelling of a preset name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "strict" => Some(Self::Strict),
            "strict+" => Some(Self::StrictPlus),
            "default" => Some(Self::Default),
            "default+" => Some(Self::DefaultPlus),
            "lenient" => Some(Self::Lenient),
            "lenient+" => Some(Self::LenientPlus),
            _ => None,
        }
    }

    /// The confidence thresholds and kill-list policy this preset maps to.
    #[must_use]
    pub const fn params(self) -> StrictnessParams {
        match self {
            Self::StrictPlus => StrictnessParams {
                general_min_confidence: 0.95,
                maintainability_min_confidence: 0.97,
                apply_false_positive_kill_list: true,
            },
            Self::Strict => StrictnessParams {
                general_min_confidence: 0.85,
                maintainability_min_confidence: 0.9,
                apply_false_positive_kill_list: true,
            },
            Self::DefaultPlus => StrictnessParams {
                general_min_confidence: 0.75,
                maintainability_min_confidence: 0.8,
                apply_false_positive_kill_list: true,
            },
            Self::Default => StrictnessParams {
                general_min_confidence: 0.6,
                maintainability_min_confidence: 0.7,
                apply_false_positive_kill_list: true,
            },
            Self::LenientPlus => StrictnessParams {
                general_min_confidence: 0.3,
                maintainability_min_confidence: 0.4,
                apply_false_positive_kill_list: true,
            },
            Self::Lenient => StrictnessParams {
                general_min_confidence: 0.15,
                maintainability_min_confidence: 0.2,
                apply_false_positive_kill_list: true,
            },
        }
    }
}

/// Confidence thresholds and false-positive filter policy a preset maps to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrictnessParams {
    pub general_min_confidence: f32,
    pub maintainability_min_confidence: f32,
    pub apply_false_positive_kill_list: bool,
}

impl StrictnessParams {
    /// Whether `finding` clears this preset's confidence bar for its category.
    #[must_use]
    pub fn keeps(&self, finding: &Finding) -> bool {
        let min = if finding.category == Category::Maintainability {
            self.maintainability_min_confidence
        } else {
            self.general_min_confidence
        };
        finding.confidence >= min
    }
}

#[cfg(test)]
mod tests {
    use stet_findings_models::{Category, Finding, Severity};

    use super::*;

    fn finding_with_confidence(confidence: f32) -> Finding {
        Finding::new(
            "a.rs".to_string(),
            1,
            None,
            Severity::Warning,
            Category::Bug,
            confidence,
            "msg".to_string(),
            None,
        )
    }

    #[test]
    fn strict_set_is_a_subset_of_default_which_is_a_subset_of_lenient() {
        let strict = StrictnessPreset::Strict.params();
        let default = StrictnessPreset::Default.params();
        let lenient = StrictnessPreset::Lenient.params();

        for hundredth in 0_u8..=100 {
            let finding = finding_with_confidence(f32::from(hundredth) / 100.0);
            let kept_strict = strict.keeps(&finding);
            let kept_default = default.keeps(&finding);
            let kept_lenient = lenient.keeps(&finding);
            if kept_strict {
                assert!(kept_default, "strict-kept finding not kept by default");
            }
            if kept_default {
                assert!(kept_lenient, "default-kept finding not kept by lenient");
            }
        }
    }

    #[test]
    fn parses_plus_variants() {
        assert_eq!(StrictnessPreset::parse("strict+"), Some(StrictnessPreset::StrictPlus));
        assert_eq!(StrictnessPreset::parse("made-up"), None);
    }
}

//! The system and per-hunk prompts sent to the model.

use indoc::formatdoc;
use stet_rag::BuiltContext;

use crate::config::ReviewConfig;

/// The reviewer persona and response-schema instructions, independent of
/// any particular hunk.
#[must_use]
pub fn system_prompt(config: &ReviewConfig) -> String {
    let nitpicky_line = if config.nitpicky {
        "Nitpicky mode is on: report style and maintainability nits you would normally filter out."
    } else {
        "Report only observations you are reasonably confident matter; omit nitpicks."
    };

    formatdoc! {r#"
        You are a careful code reviewer examining a single hunk of a diff at
        a time. {nitpicky_line}

        Respond with a single JSON object of the shape:
        {{"findings": [{{"file": string, "line": integer, "severity": "info"|"warning"|"error", "category": "bug"|"style"|"maintainability"|"security"|"performance"|"correctness"|"other", "confidence": number between 0 and 1, "message": string, "suggested_replacement": string or null}}]}}

        Review strictness preset: {strictness}. If nothing in the hunk
        warrants a finding, respond with {{"findings": []}}. Never wrap the
        JSON in prose or a code fence.
    "#, strictness = config.strictness}
}

/// The per-hunk prompt body: the composed context, with instructions to
/// review only the changed lines.
#[must_use]
pub fn hunk_prompt(built_context: &BuiltContext) -> String {
    formatdoc! {r#"
        Review the following hunk. Only comment on lines marked `+` or `-`;
        context lines (marked with a leading space) are shown for
        understanding only.

        {context}
    "#, context = built_context.text}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_mentions_the_strictness_preset() {
        let config = ReviewConfig {
            strictness: "strict+".to_string(),
            ..ReviewConfig::default()
        };
        assert!(system_prompt(&config).contains("strict+"));
    }

    #[test]
    fn nitpicky_mode_changes_the_framing() {
        let mut config = ReviewConfig::default();
        config.nitpicky = true;
        assert!(system_prompt(&config).contains("Nitpicky mode is on"));
    }

    #[test]
    fn hunk_prompt_includes_the_composed_context() {
        let built = BuiltContext {
            text: "File: a.rs\nHunk: @@ -1,1 +1,1 @@".to_string(),
            estimated_tokens: 10,
            exceeded_warn_threshold: false,
        };
        assert!(hunk_prompt(&built).contains("File: a.rs"));
    }
}

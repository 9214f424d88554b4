//! Approximate token counting. A real tokenizer is not worth the
//! dependency weight for budget enforcement; four characters per token is
//! the heuristic the rest of the pipeline is specified against.

/// Estimate the token count of `text` as `ceil(len / 4)`.
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}

/// Truncate `text` so its estimated token count does not exceed `max_tokens`,
/// cutting at a character boundary.
#[must_use]
pub fn truncate_to_tokens(text: &str, max_tokens: usize) -> String {
    let max_chars = max_tokens.saturating_mul(4);
    if text.len() <= max_chars {
        return text.to_string();
    }
    let mut end = max_chars.min(text.len());
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let text = "héllo world";
        let truncated = truncate_to_tokens(text, 1);
        assert!(text.starts_with(&truncated));
    }

    #[test]
    fn truncate_is_noop_under_budget() {
        let text = "short";
        assert_eq!(truncate_to_tokens(text, 100), text);
    }
}

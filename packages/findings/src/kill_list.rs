//! A fixed list of message patterns known to be low-signal, filtered out
//! unless nitpicky mode is on.
//!
//! Whether the original implementation intended substring or regex
//! matching against these patterns is not documented; this crate
//! implements case-insensitive substring match, per the spec's own
//! resolution of that ambiguity.

/// Message substrings (case folded) that mark a finding as boilerplate the
/// model produces far more often than it produces real signal.
const KILL_LIST: &[&str] = &[
    "consider adding a comment",
    "could be more descriptive",
    "missing trailing newline",
    "consider using a more descriptive variable name",
    "this line is too long",
    "consider adding a docstring",
    "consider adding type hints",
    "inconsistent spacing",
    "extra blank line",
    "missing blank line",
    "consider renaming",
    "typo in comment",
    "unnecessary whitespace",
];

/// Whether `message` matches a known low-signal pattern.
#[must_use]
pub fn is_low_signal(message: &str) -> bool {
    let lower = message.to_lowercase();
    KILL_LIST.iter().any(|pattern| lower.contains(pattern))
}

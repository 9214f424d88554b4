#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Shared types for stet's change partitioner.
//!
//! A [`Hunk`] is the unit the rest of the pipeline operates on: one `@@ … @@`
//! region of a unified diff, carrying enough of its own context to be
//! fingerprinted independent of where it came from.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One `@@ … @@` region of a unified diff, attributed to a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    /// File path relative to the repository root.
    pub file: String,
    /// First line of the pre-image range.
    pub old_start: u64,
    /// Line count of the pre-image range.
    pub old_count: u64,
    /// First line of the post-image range.
    pub new_start: u64,
    /// Line count of the post-image range.
    pub new_count: u64,
    /// The hunk header plus every prefixed line, verbatim.
    pub raw_body: String,
    /// Content-addressed identity of this hunk, stable across runs.
    pub fingerprint: String,
}

impl Hunk {
    /// Build a `Hunk`, computing its fingerprint from `file` and `raw_body`.
    #[must_use]
    pub fn new(
        file: String,
        old_start: u64,
        old_count: u64,
        new_start: u64,
        new_count: u64,
        raw_body: String,
    ) -> Self {
        let fingerprint = fingerprint(&file, &raw_body);
        Self {
            file,
            old_start,
            old_count,
            new_start,
            new_count,
            raw_body,
            fingerprint,
        }
    }
}

/// Normalize a repo-relative path so that `a/./b`, backslashes, and a
/// leading `./` never cause two logically-identical hunks to fingerprint
/// differently.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let path = path.strip_prefix("./").unwrap_or(path);
    path.replace('\\', "/")
}

/// Content-address a hunk from its normalized path and raw body.
///
/// Line endings are normalized to `\n` before hashing so that a repository
/// checked out with different `core.autocrlf` settings still produces the
/// same fingerprint for an unchanged hunk.
#[must_use]
pub fn fingerprint(file: &str, raw_body: &str) -> String {
    let normalized_path = normalize_path(file);
    let normalized_body = raw_body.replace("\r\n", "\n");
    let mut hasher = Sha256::new();
    hasher.update(normalized_path.as_bytes());
    hasher.update([0u8]);
    hasher.update(normalized_body.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_across_identical_input() {
        let a = fingerprint("src/lib.rs", "@@ -1,2 +1,2 @@\n-old\n+new\n");
        let b = fingerprint("src/lib.rs", "@@ -1,2 +1,2 @@\n-old\n+new\n");
        assert_eq!(a, b);
    }

    #[test]
    fn fingerprint_ignores_line_ending_style() {
        let unix = fingerprint("src/lib.rs", "@@ -1,2 +1,2 @@\n-old\n+new\n");
        let windows = fingerprint("src/lib.rs", "@@ -1,2 +1,2 @@\r\n-old\r\n+new\r\n");
        assert_eq!(unix, windows);
    }

    #[test]
    fn fingerprint_ignores_leading_dot_slash() {
        let a = fingerprint("./src/lib.rs", "body");
        let b = fingerprint("src/lib.rs", "body");
        assert_eq!(a, b);
    }

    #[test]
    fn fingerprint_differs_on_content_change() {
        let a = fingerprint("src/lib.rs", "@@ -1,1 +1,1 @@\n-old\n");
        let b = fingerprint("src/lib.rs", "@@ -1,1 +1,1 @@\n-new\n");
        assert_ne!(a, b);
    }
}

//! Unified diff hunk splitting.
//!
//! Input is the raw multi-file unified diff blob `git diff` produces.
//! Output is a flat list of [`Hunk`]s, one per `@@ … @@` region, each
//! attributed to the file header that precedes it. Binary-file markers and
//! rename-only diffs (no `@@` lines at all) contribute no hunks.

use std::sync::LazyLock;

use regex::Regex;
use stet_diff_models::Hunk;

/// `@@ -oldStart[,oldCount] +newStart[,newCount] @@`
pub(crate) static HUNK_HEADER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@@ -(\d+),?(\d*) \+(\d+),?(\d*) @@").unwrap());

/// Split a unified diff blob into hunks.
#[must_use]
pub fn parse_hunks(diff_text: &str) -> Vec<Hunk> {
    let lines: Vec<&str> = diff_text.lines().collect();
    let mut hunks = Vec::new();
    let mut old_path: Option<String> = None;
    let mut new_path: Option<String> = None;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if let Some(path) = line.strip_prefix("--- ") {
            old_path = file_path_from_header(path);
            i += 1;
            continue;
        }

        if let Some(path) = line.strip_prefix("+++ ") {
            new_path = file_path_from_header(path);
            i += 1;
            continue;
        }

        if line.starts_with("Binary files ") && line.ends_with(" differ") {
            i += 1;
            continue;
        }

        if HUNK_HEADER_REGEX.is_match(line) {
            // New-side path wins (modified/added files); a deleted file has
            // no new-side path, so fall back to the old-side one.
            let Some(file) = new_path.clone().or_else(|| old_path.clone()) else {
                i += 1;
                continue;
            };
            if let Some(hunk) = parse_hunk(&lines, &mut i, &file) {
                hunks.push(hunk);
            }
            continue;
        }

        i += 1;
    }

    hunks
}

/// `+++ b/path/to/file` → `path/to/file`; `/dev/null` marks an added or
/// removed side and carries no path.
fn file_path_from_header(path: &str) -> Option<String> {
    if path == "/dev/null" {
        return None;
    }
    Some(
        path.strip_prefix("b/")
            .or_else(|| path.strip_prefix("a/"))
            .unwrap_or(path)
            .to_string(),
    )
}

fn parse_hunk(lines: &[&str], i: &mut usize, file: &str) -> Option<Hunk> {
    let header = lines[*i];
    let captures = HUNK_HEADER_REGEX.captures(header)?;

    let old_start = captures[1].parse::<u64>().ok()?;
    let old_count = if captures[2].is_empty() {
        1
    } else {
        captures[2].parse::<u64>().ok()?
    };
    let new_start = captures[3].parse::<u64>().ok()?;
    let new_count = if captures[4].is_empty() {
        1
    } else {
        captures[4].parse::<u64>().ok()?
    };

    let start = *i;
    *i += 1;
    while *i < lines.len() {
        let line = lines[*i];
        if line.starts_with("@@")
            || line.starts_with("diff --git")
            || line.starts_with("--- ")
            || line.starts_with("+++ ")
        {
            break;
        }
        *i += 1;
    }
    let raw_body = lines[start..*i].join("\n");

    Some(Hunk::new(
        file.to_string(),
        old_start,
        old_count,
        new_start,
        new_count,
        raw_body,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_hunk() {
        let diff = "diff --git a/src/lib.rs b/src/lib.rs\n--- a/src/lib.rs\n+++ b/src/lib.rs\n@@ -1,4 +1,4 @@\n fn main() {\n-    println!(\"Hello\");\n+    println!(\"World\");\n }";
        let hunks = parse_hunks(diff);
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].file, "src/lib.rs");
        assert_eq!(hunks[0].old_start, 1);
        assert_eq!(hunks[0].new_start, 1);
        assert!(hunks[0].raw_body.starts_with("@@ -1,4 +1,4 @@"));
    }

    #[test]
    fn parses_multiple_hunks_in_one_file() {
        let diff = "--- a/f.txt\n+++ b/f.txt\n@@ -1,3 +1,3 @@\n line1\n-old2\n+new2\n line3\n@@ -10,3 +10,3 @@\n line10\n-old11\n+new11\n line12";
        let hunks = parse_hunks(diff);
        assert_eq!(hunks.len(), 2);
        assert_eq!(hunks[0].old_start, 1);
        assert_eq!(hunks[1].old_start, 10);
    }

    #[test]
    fn parses_multiple_files() {
        let diff = "diff --git a/a.rs b/a.rs\n--- a/a.rs\n+++ b/a.rs\n@@ -1,1 +1,1 @@\n-a\n+b\ndiff --git a/b.rs b/b.rs\n--- a/b.rs\n+++ b/b.rs\n@@ -2,1 +2,1 @@\n-c\n+d";
        let hunks = parse_hunks(diff);
        assert_eq!(hunks.len(), 2);
        assert_eq!(hunks[0].file, "a.rs");
        assert_eq!(hunks[1].file, "b.rs");
    }

    #[test]
    fn skips_binary_file_markers() {
        let diff = "diff --git a/img.png b/img.png\nBinary files a/img.png and b/img.png differ";
        let hunks = parse_hunks(diff);
        assert!(hunks.is_empty());
    }

    #[test]
    fn rename_only_diff_has_no_hunks() {
        let diff = "diff --git a/old.rs b/new.rs\nsimilarity index 100%\nrename from old.rs\nrename to new.rs";
        let hunks = parse_hunks(diff);
        assert!(hunks.is_empty());
    }

    #[test]
    fn deleted_file_attributes_hunk_to_old_path() {
        let diff = "diff --git a/gone.rs b/gone.rs\n--- a/gone.rs\n+++ /dev/null\n@@ -1,2 +0,0 @@\n-fn gone() {}\n-";
        let hunks = parse_hunks(diff);
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].file, "gone.rs");
    }

    #[test]
    fn fingerprint_is_reproduced_on_rerun() {
        let diff = "--- a/f.txt\n+++ b/f.txt\n@@ -1,1 +1,1 @@\n-a\n+b";
        let once = parse_hunks(diff);
        let twice = parse_hunks(diff);
        assert_eq!(once[0].fingerprint, twice[0].fingerprint);
    }
}

//! Per-language whitespace reduction applied to a hunk's raw body before it
//! is spent on prompt tokens.
//!
//! The header line is kept byte-for-byte; every other line keeps its diff
//! marker (` `, `-`, `+`) but has leading whitespace trimmed and internal
//! runs of spaces/tabs collapsed to one space. Languages where in-line
//! whitespace is significant (Python's indentation) are left untouched.

use crate::parser::HUNK_HEADER_REGEX;

/// Extensions whose syntax gives whitespace semantic meaning; minifying
/// them could change what the source means.
const INDENTATION_SENSITIVE_EXTENSIONS: &[&str] = &["py", "pyi", "yaml", "yml", "haml"];

/// Minify `raw_body` for `file_path`'s language.
///
/// Returns the input unchanged if the first line is not a valid hunk
/// header, or if the file extension is indentation-sensitive.
#[must_use]
pub fn minify_hunk(raw_body: &str, file_path: &str) -> String {
    if is_indentation_sensitive(file_path) {
        return raw_body.to_string();
    }

    let mut lines = raw_body.lines();
    let Some(header) = lines.next() else {
        return String::new();
    };
    if !HUNK_HEADER_REGEX.is_match(header) {
        return raw_body.to_string();
    }

    let mut out = String::from(header);
    for line in lines {
        out.push('\n');
        out.push_str(&minify_line(line));
    }
    out
}

fn is_indentation_sensitive(file_path: &str) -> bool {
    file_path
        .rsplit('.')
        .next()
        .is_some_and(|ext| INDENTATION_SENSITIVE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

fn minify_line(line: &str) -> String {
    if line.is_empty() {
        return String::new();
    }
    let mut chars = line.chars();
    let marker = chars.next().unwrap();
    let rest = chars.as_str();
    if rest.trim().is_empty() {
        return marker.to_string();
    }
    let collapsed = collapse_whitespace(rest.trim_start());
    format!("{marker}{collapsed}")
}

fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for c in s.chars() {
        if c == ' ' || c == '\t' {
            if !prev_space {
                out.push(' ');
            }
            prev_space = true;
        } else {
            out.push(c);
            prev_space = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_header_verbatim() {
        let body = "@@ -1,2 +1,2 @@\n-    let   x = 1;\n+    let   x = 2;";
        let minified = minify_hunk(body, "src/lib.rs");
        assert!(minified.starts_with("@@ -1,2 +1,2 @@\n"));
    }

    #[test]
    fn collapses_internal_whitespace_and_keeps_marker() {
        let body = "@@ -1,1 +1,1 @@\n-    let   x    =   1;";
        let minified = minify_hunk(body, "src/lib.rs");
        assert_eq!(minified, "@@ -1,1 +1,1 @@\n-let x = 1;");
    }

    #[test]
    fn preserves_blank_lines() {
        let body = "@@ -1,2 +1,2 @@\n \n+added";
        let minified = minify_hunk(body, "src/lib.rs");
        assert_eq!(minified, "@@ -1,2 +1,2 @@\n \n+added");
    }

    #[test]
    fn leaves_non_hunk_input_unchanged() {
        let body = "not a hunk header\nsome text";
        assert_eq!(minify_hunk(body, "src/lib.rs"), body);
    }

    #[test]
    fn skips_indentation_sensitive_languages() {
        let body = "@@ -1,1 +1,1 @@\n-    x    =    1";
        let minified = minify_hunk(body, "script.py");
        assert_eq!(minified, body);
    }
}

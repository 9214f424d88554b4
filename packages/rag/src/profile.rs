//! Per-language knowledge needed to find and excerpt a definition: which
//! file extensions it covers, how to build a POSIX ERE matching a
//! definition of a given name, where a signature stops, and how its
//! docstrings are written.

/// A fixed point-in-time git-grep pattern plus some excerpting rules for
/// one language family.
#[derive(Clone)]
pub struct LanguageProfile {
    /// File extensions (without the dot) this profile applies to.
    pub extensions: &'static [&'static str],
    /// Characters that terminate a signature excerpt.
    pub stop_chars: &'static [char],
    /// Line prefixes that mark a preceding doc-comment line.
    pub comment_prefixes: &'static [&'static str],
    /// If true, the docstring is a triple-quoted string immediately
    /// following the signature rather than preceding comment lines.
    pub trailing_docstring: bool,
    definition_pattern: fn(&str) -> String,
    call_site_pattern: fn(&str) -> String,
    declaration_regex: &'static str,
}

impl LanguageProfile {
    /// Build a POSIX extended-regex pattern matching a definition of `name`.
    #[must_use]
    pub fn definition_pattern(&self, name: &str) -> String {
        (self.definition_pattern)(name)
    }

    /// Build a POSIX extended-regex pattern matching call sites of `name`.
    #[must_use]
    pub fn call_site_pattern(&self, name: &str) -> String {
        (self.call_site_pattern)(name)
    }

    /// A regex (Rust `regex` crate syntax) matching any declaration in this
    /// language, with the symbol name in capture group 1. Used to find the
    /// function enclosing a hunk.
    #[must_use]
    pub const fn declaration_regex(&self) -> &'static str {
        self.declaration_regex
    }

    #[must_use]
    pub fn matches_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

fn escape(name: &str) -> String {
    // POSIX ERE metacharacters that could appear in an identifier-derived
    // pattern; identifiers never legitimately contain them, but stay safe.
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if "\\.^$*+?()[]{}|".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[must_use]
pub fn go() -> LanguageProfile {
    LanguageProfile {
        extensions: &["go"],
        stop_chars: &['{'],
        comment_prefixes: &["//"],
        trailing_docstring: false,
        definition_pattern: |name| {
            let name = escape(name);
            format!(r"^func([[:space:]]*\([^)]*\))?[[:space:]]+{name}\(")
        },
        call_site_pattern: |name| {
            let name = escape(name);
            format!(r"[^[:alnum:]_.]{name}\(|\.{name}\(")
        },
        declaration_regex: r"^func(?:\s*\([^)]*\))?\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(",
    }
}

#[must_use]
pub fn rust() -> LanguageProfile {
    LanguageProfile {
        extensions: &["rs"],
        stop_chars: &['{', ';'],
        comment_prefixes: &["///", "//!", "//"],
        trailing_docstring: false,
        definition_pattern: |name| {
            let name = escape(name);
            format!(
                r"^[[:space:]]*(pub([[:space:]]*\([^)]*\))?[[:space:]]+)?(async[[:space:]]+)?(fn|struct|trait|enum)[[:space:]]+{name}\b"
            )
        },
        call_site_pattern: |name| {
            let name = escape(name);
            format!(r"[^[:alnum:]_]{name}\(|::{name}\(")
        },
        declaration_regex: r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?(?:fn|struct|trait|enum)\s+([A-Za-z_][A-Za-z0-9_]*)",
    }
}

#[must_use]
pub fn python() -> LanguageProfile {
    LanguageProfile {
        extensions: &["py", "pyi"],
        stop_chars: &[':'],
        comment_prefixes: &["#"],
        trailing_docstring: true,
        definition_pattern: |name| {
            let name = escape(name);
            format!(r"^[[:space:]]*(async[[:space:]]+)?(def|class)[[:space:]]+{name}\b")
        },
        call_site_pattern: |name| {
            let name = escape(name);
            format!(r"[^[:alnum:]_.]{name}\(")
        },
        declaration_regex: r"^\s*(?:async\s+)?(?:def|class)\s+([A-Za-z_][A-Za-z0-9_]*)",
    }
}

#[must_use]
pub fn javascript() -> LanguageProfile {
    LanguageProfile {
        extensions: &["js", "jsx", "ts", "tsx", "mjs"],
        stop_chars: &['{', '=', ';'],
        comment_prefixes: &["///", "//"],
        trailing_docstring: false,
        definition_pattern: |name| {
            let name = escape(name);
            format!(
                r"^[[:space:]]*(export[[:space:]]+)?(default[[:space:]]+)?(async[[:space:]]+)?(function|class)[[:space:]]+{name}\b|^[[:space:]]*(export[[:space:]]+)?(const|let)[[:space:]]+{name}[[:space:]]*="
            )
        },
        call_site_pattern: |name| {
            let name = escape(name);
            format!(r"[^[:alnum:]_.]{name}\(|\.{name}\(")
        },
        declaration_regex: r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?(?:function|class)\s+([A-Za-z_$][A-Za-z0-9_$]*)",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn go_profile_covers_go_extension() {
        assert!(go().matches_extension("go"));
        assert!(!go().matches_extension("rs"));
    }

    #[test]
    fn definition_pattern_escapes_metacharacters() {
        let pattern = rust().definition_pattern("Foo.Bar");
        assert!(pattern.contains(r"Foo\.Bar"));
    }
}

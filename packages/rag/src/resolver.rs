//! Per-hunk candidate extraction and grep-based definition resolution.

use std::{collections::HashSet, path::Path, sync::LazyLock};

use regex::Regex;
use stet_git::GitOps;
use stet_git_models::GrepMatch;
use tokio_util::sync::CancellationToken;

use crate::{registry::SymbolResolverRegistry, tokens};

const MAX_CANDIDATES: usize = 30;
const SIGNATURE_LINES: usize = 6;
const DOCSTRING_LINES: usize = 5;

static CALL_SITE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap());
static CAPITALIZED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z][A-Za-z0-9_]*)\b").unwrap());
static DECL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:fn|def|class|struct|trait|enum|func)\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap()
});

const KEYWORDS: &[&str] = &[
    "if", "else", "for", "while", "return", "func", "function", "let", "const", "var", "pub",
    "impl", "use", "mod", "package", "import", "from", "as", "match", "switch", "case", "break",
    "continue", "true", "false", "nil", "null", "self", "this", "new", "class", "def", "fn",
    "struct", "enum", "trait", "interface", "type", "namespace", "static", "async", "await",
    "try", "catch", "throw", "throws", "finally", "public", "private", "protected", "void",
    "int", "string", "bool", "float", "double", "in", "is", "not", "and", "or", "with",
];

/// A symbol definition found via grep, with a short excerpt of its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub symbol: String,
    pub file: String,
    pub line: u64,
    pub signature: String,
    pub docstring: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions {
    pub max_definitions: usize,
    pub max_tokens: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            max_definitions: 8,
            max_tokens: 0,
        }
    }
}

/// Extract candidate identifiers from a hunk body: declaration names,
/// capitalized type-looking identifiers, and call-site identifiers, in
/// order of first appearance, keywords dropped, capped at 30.
#[must_use]
pub fn extract_candidates(hunk_content: &str) -> Vec<String> {
    let mut matches: Vec<(usize, String)> = Vec::new();
    for re in [&*DECL_RE, &*CAPITALIZED_RE, &*CALL_SITE_RE] {
        for m in re.captures_iter(hunk_content) {
            let group = m.get(1).unwrap();
            matches.push((group.start(), group.as_str().to_string()));
        }
    }
    matches.sort_by_key(|(pos, _)| *pos);

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for (_, name) in matches {
        if KEYWORDS.contains(&name.as_str()) {
            continue;
        }
        if seen.insert(name.clone()) {
            out.push(name);
            if out.len() >= MAX_CANDIDATES {
                break;
            }
        }
    }
    out
}

/// Reject anything that could escape the repository: `..` segments, or an
/// absolute path outside `repo_root` once resolved.
fn is_path_safe(repo_root: &Path, file: &str) -> bool {
    if file.split('/').any(|seg| seg == "..") {
        return false;
    }
    !Path::new(file).is_absolute()
}

async fn read_lines(repo_root: &Path, file: &str) -> Option<Vec<String>> {
    if !is_path_safe(repo_root, file) {
        return None;
    }
    let content = tokio::fs::read_to_string(repo_root.join(file)).await.ok()?;
    Some(content.lines().map(str::to_string).collect())
}

fn extract_signature(lines: &[String], start_idx: usize, stop_chars: &[char]) -> String {
    let mut collected = Vec::new();
    for line in lines.iter().skip(start_idx).take(SIGNATURE_LINES) {
        collected.push(line.clone());
        if line.chars().any(|c| stop_chars.contains(&c)) {
            break;
        }
    }
    collected.join("\n")
}

fn extract_leading_docstring(lines: &[String], start_idx: usize, prefixes: &[&str]) -> Option<String> {
    let mut collected = Vec::new();
    let mut idx = start_idx;
    while idx > 0 && collected.len() < DOCSTRING_LINES {
        let candidate = lines[idx - 1].trim_start();
        if prefixes.iter().any(|p| candidate.starts_with(p)) {
            collected.push(lines[idx - 1].clone());
            idx -= 1;
        } else {
            break;
        }
    }
    if collected.is_empty() {
        None
    } else {
        collected.reverse();
        Some(collected.join("\n"))
    }
}

fn extract_trailing_docstring(lines: &[String], after_idx: usize) -> Option<String> {
    let first = lines.get(after_idx)?.trim_start();
    if !(first.starts_with("\"\"\"") || first.starts_with("'''")) {
        return None;
    }
    let quote = &first[..3];
    let mut collected = vec![lines[after_idx].clone()];
    if first.len() > 3 && first[3..].contains(quote) {
        return Some(collected.join("\n"));
    }
    for line in lines.iter().skip(after_idx + 1).take(DOCSTRING_LINES) {
        collected.push(line.clone());
        if line.contains(quote) {
            break;
        }
    }
    Some(collected.join("\n"))
}

/// Resolve a single symbol name to its definition via git-grep, independent
/// of any hunk. Used both per-candidate below and by the call-graph
/// resolver when it already knows the exact identifier it wants.
pub async fn resolve_one_symbol(
    git: &dyn GitOps,
    repo_root: &Path,
    profile: &crate::profile::LanguageProfile,
    name: &str,
    ct: &CancellationToken,
) -> Option<Definition> {
    let pattern = profile.definition_pattern(name);
    let mut matches = git.grep(repo_root, &pattern, ct).await.ok()?;
    matches.sort_by(|a, b| a.file.cmp(&b.file).then(a.line.cmp(&b.line)));
    let GrepMatch { file, line, .. } = matches.into_iter().next()?;
    if !is_path_safe(repo_root, &file) {
        return None;
    }
    let lines = read_lines(repo_root, &file).await?;
    let start_idx = (line as usize).checked_sub(1)?;
    if start_idx >= lines.len() {
        return None;
    }

    let signature = extract_signature(&lines, start_idx, profile.stop_chars);
    let docstring = if profile.trailing_docstring {
        let sig_lines = signature.lines().count();
        extract_trailing_docstring(&lines, start_idx + sig_lines)
    } else {
        extract_leading_docstring(&lines, start_idx, profile.comment_prefixes)
    };

    Some(Definition {
        symbol: name.to_string(),
        file,
        line,
        signature,
        docstring,
    })
}

/// Resolve definitions for every candidate symbol found in `hunk_content`.
///
/// Silent on any per-symbol failure (grep timeout, unreadable file, no
/// match): the caller receives whatever was found.
pub async fn resolve_symbols(
    git: &dyn GitOps,
    repo_root: &Path,
    registry: &SymbolResolverRegistry,
    file_path: &str,
    hunk_content: &str,
    opts: &ResolveOptions,
    ct: &CancellationToken,
) -> Vec<Definition> {
    let Some(profile) = registry.resolve(file_path) else {
        return Vec::new();
    };

    let candidates = extract_candidates(hunk_content);
    let mut definitions = Vec::new();
    let mut budget_used = 0usize;

    for name in candidates {
        if definitions.len() >= opts.max_definitions {
            break;
        }
        let Some(def) = resolve_one_symbol(git, repo_root, profile, &name, ct).await else {
            continue;
        };

        let estimated = tokens::estimate_tokens(&def.signature)
            + def.docstring.as_deref().map_or(0, tokens::estimate_tokens);
        if opts.max_tokens > 0 && budget_used + estimated > opts.max_tokens && !definitions.is_empty() {
            break;
        }
        budget_used += estimated;

        definitions.push(def);
    }

    definitions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_declarations_call_sites_and_types() {
        let hunk = " func handleRequest(req *Request) *Response {\n+    logger := NewLogger()\n+    return process(req)\n }";
        let candidates = extract_candidates(hunk);
        assert!(candidates.contains(&"handleRequest".to_string()));
        assert!(candidates.contains(&"NewLogger".to_string()));
        assert!(candidates.contains(&"process".to_string()));
        assert!(!candidates.contains(&"func".to_string()));
    }

    #[test]
    fn dedupes_preserving_first_occurrence_order() {
        let hunk = "+foo()\n+bar()\n+foo()";
        let candidates = extract_candidates(hunk);
        assert_eq!(candidates, vec!["foo".to_string(), "bar".to_string()]);
    }

    #[test]
    fn caps_at_thirty_candidates() {
        let hunk: String = (0..50).map(|i| format!("+call{i}()\n")).collect();
        let candidates = extract_candidates(&hunk);
        assert_eq!(candidates.len(), MAX_CANDIDATES);
    }

    #[test]
    fn rejects_parent_traversal_paths() {
        assert!(!is_path_safe(Path::new("/repo"), "../../etc/passwd"));
        assert!(is_path_safe(Path::new("/repo"), "src/lib.rs"));
    }
}

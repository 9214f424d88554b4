//! Caller/callee resolution for the function enclosing a hunk.
//!
//! Go is the canonical target: its declaration grammar is simple enough
//! that the nearest-preceding-declaration heuristic below rarely
//! misattributes a hunk. Other registered languages get the same
//! heuristic; anything it can't confidently place returns `None` rather
//! than guess.

use std::{path::Path, sync::LazyLock};

use regex::Regex;
use stet_diff_models::Hunk;
use stet_git::GitOps;
use tokio_util::sync::CancellationToken;

use crate::{
    registry::SymbolResolverRegistry,
    resolver::{Definition, resolve_one_symbol},
};

const MAX_FILE_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct CallGraphOptions {
    pub callers_max: usize,
    pub callees_max: usize,
}

impl Default for CallGraphOptions {
    fn default() -> Self {
        Self {
            callers_max: 10,
            callees_max: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CallGraph {
    pub enclosing_function: String,
    pub callers: Vec<stet_git_models::GrepMatch>,
    pub callees: Vec<Definition>,
}

struct Enclosing {
    name: String,
    start_line: usize,
    end_line: usize,
}

fn find_enclosing(lines: &[&str], decl_regex: &Regex, hunk_start: usize, hunk_end: usize) -> Option<Enclosing> {
    let decls: Vec<(usize, String)> = lines
        .iter()
        .enumerate()
        .filter_map(|(idx, line)| {
            decl_regex
                .captures(line)
                .map(|c| (idx, c.get(1).unwrap().as_str().to_string()))
        })
        .collect();

    let pos = decls
        .iter()
        .rposition(|(idx, _)| idx + 1 <= hunk_start)?;
    let (start_line, name) = decls[pos].clone();
    let end_line = decls
        .get(pos + 1)
        .map_or(lines.len(), |(next_idx, _)| *next_idx);

    if hunk_end > end_line {
        return None;
    }
    Some(Enclosing {
        name,
        start_line,
        end_line,
    })
}

/// Resolve the call graph around the function enclosing `hunk` in `file_path`.
///
/// Returns `None` silently if the language is unregistered, the file is
/// over the 1 MiB cap, or no enclosing declaration contains the hunk.
pub async fn resolve_call_graph(
    git: &dyn GitOps,
    repo_root: &Path,
    registry: &SymbolResolverRegistry,
    file_path: &str,
    hunk: &Hunk,
    opts: &CallGraphOptions,
    ct: &CancellationToken,
) -> Option<CallGraph> {
    let profile = registry.resolve(file_path)?;
    let metadata = tokio::fs::metadata(repo_root.join(file_path)).await.ok()?;
    if metadata.len() > MAX_FILE_BYTES {
        return None;
    }
    let content = tokio::fs::read_to_string(repo_root.join(file_path)).await.ok()?;
    let lines: Vec<&str> = content.lines().collect();
    let decl_regex = Regex::new(profile.declaration_regex()).ok()?;

    let hunk_start = hunk.new_start.max(1) as usize;
    let hunk_end = (hunk.new_start + hunk.new_count.max(1)).saturating_sub(1) as usize;
    let enclosing = find_enclosing(&lines, &decl_regex, hunk_start, hunk_end)?;

    let caller_pattern = profile.call_site_pattern(&enclosing.name);
    let callers: Vec<_> = git
        .grep(repo_root, &caller_pattern, ct)
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|m| !(m.file == file_path && (m.line as usize) == enclosing.start_line + 1))
        .take(opts.callers_max)
        .collect();

    let body_end = enclosing.end_line.min(lines.len());
    let body = lines[enclosing.start_line..body_end].join("\n");
    let callee_names = static_call_site_regex()
        .captures_iter(&body)
        .map(|c| c.get(1).unwrap().as_str().to_string())
        .take(opts.callees_max * 3);

    let mut callees = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for name in callee_names {
        if callees.len() >= opts.callees_max {
            break;
        }
        if name == enclosing.name || !seen.insert(name.clone()) {
            continue;
        }
        if let Some(def) = resolve_one_symbol(git, repo_root, profile, &name, ct).await {
            callees.push(def);
        }
    }

    Some(CallGraph {
        enclosing_function: enclosing.name,
        callers,
        callees,
    })
}

fn static_call_site_regex() -> &'static Regex {
    static RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap());
    &RE
}

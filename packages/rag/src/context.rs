//! Composes the per-hunk prompt body and enforces token budgets.

use stet_diff_models::Hunk;

use crate::{callgraph::CallGraph, resolver::Definition, tokens};

/// Token budgets enforced while composing a hunk's context.
#[derive(Debug, Clone, Copy)]
pub struct ContextBudget {
    /// Overall ceiling for the composed context. Zero means unbounded.
    pub context_limit: usize,
    /// Emit a warning (but do not truncate) once the composed context
    /// crosses this many estimated tokens.
    pub warn_threshold: usize,
    /// Ceiling on the related-definitions block alone. Zero means unbounded.
    pub rag_symbol_max_tokens: usize,
    /// Ceiling on the call-graph block alone. Zero means unbounded.
    pub call_graph_max_tokens: usize,
}

impl Default for ContextBudget {
    fn default() -> Self {
        Self {
            context_limit: 6000,
            warn_threshold: 4500,
            rag_symbol_max_tokens: 1500,
            call_graph_max_tokens: 1000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuiltContext {
    pub text: String,
    pub estimated_tokens: usize,
    pub exceeded_warn_threshold: bool,
}

/// Compose the header, minified hunk, related-definitions block, and
/// optional call-graph block into one prompt-ready string, enforcing
/// `budget` along the way.
#[must_use]
pub fn build_context(
    file: &str,
    hunk: &Hunk,
    minified_body: &str,
    definitions: &[Definition],
    call_graph: Option<&CallGraph>,
    budget: &ContextBudget,
) -> BuiltContext {
    let mut sections = vec![format!(
        "File: {file}\nHunk: @@ -{},{} +{},{} @@",
        hunk.old_start, hunk.old_count, hunk.new_start, hunk.new_count
    )];
    sections.push(minified_body.to_string());

    if !definitions.is_empty() {
        sections.push(render_definitions(definitions, budget.rag_symbol_max_tokens));
    }

    if let Some(call_graph) = call_graph {
        sections.push(render_call_graph(call_graph, budget.call_graph_max_tokens));
    }

    let mut text = sections.join("\n\n");
    let mut estimated_tokens = tokens::estimate_tokens(&text);
    let exceeded_warn_threshold =
        budget.warn_threshold > 0 && estimated_tokens > budget.warn_threshold;

    if budget.context_limit > 0 && estimated_tokens > budget.context_limit {
        text = tokens::truncate_to_tokens(&text, budget.context_limit);
        estimated_tokens = tokens::estimate_tokens(&text);
    }

    BuiltContext {
        text,
        estimated_tokens,
        exceeded_warn_threshold,
    }
}

fn render_definitions(definitions: &[Definition], max_tokens: usize) -> String {
    let mut block = String::from("Related definitions:\n");
    let mut used = 0usize;
    for def in definitions {
        let mut entry = format!("- {} ({}:{})\n", def.symbol, def.file, def.line);
        if let Some(doc) = &def.docstring {
            entry.push_str(doc);
            entry.push('\n');
        }
        entry.push_str(&def.signature);
        entry.push('\n');

        let cost = tokens::estimate_tokens(&entry);
        if max_tokens > 0 && used + cost > max_tokens && used > 0 {
            break;
        }
        used += cost;
        block.push_str(&entry);
    }
    block
}

fn render_call_graph(call_graph: &CallGraph, max_tokens: usize) -> String {
    let mut block = format!("Call graph for {}:\n", call_graph.enclosing_function);
    for caller in &call_graph.callers {
        block.push_str(&format!(
            "  called by {}:{}: {}\n",
            caller.file, caller.line, caller.content
        ));
    }
    for callee in &call_graph.callees {
        block.push_str(&format!("  calls {} ({}:{})\n", callee.symbol, callee.file, callee.line));
    }
    if max_tokens > 0 {
        return tokens::truncate_to_tokens(&block, max_tokens);
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_hunk() -> Hunk {
        Hunk::new(
            "src/lib.rs".to_string(),
            1,
            2,
            1,
            2,
            "@@ -1,2 +1,2 @@\n-old\n+new".to_string(),
        )
    }

    #[test]
    fn composes_header_and_hunk_without_extras() {
        let hunk = sample_hunk();
        let built = build_context(
            "src/lib.rs",
            &hunk,
            &hunk.raw_body.clone(),
            &[],
            None,
            &ContextBudget::default(),
        );
        assert!(built.text.contains("File: src/lib.rs"));
        assert!(built.text.contains("@@ -1,2 +1,2 @@"));
    }

    #[test]
    fn truncates_once_over_context_limit() {
        let hunk = sample_hunk();
        let budget = ContextBudget {
            context_limit: 5,
            warn_threshold: 1,
            ..ContextBudget::default()
        };
        let built = build_context("src/lib.rs", &hunk, &hunk.raw_body.clone(), &[], None, &budget);
        assert!(built.estimated_tokens <= 5);
        assert!(built.exceeded_warn_threshold);
    }
}

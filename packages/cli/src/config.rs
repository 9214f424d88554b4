//! Resolves a [`ReviewConfig`] from clap flags layered over whatever the
//! current session already committed to, layered over hardcoded defaults.
//!
//! `stet_core` never reads flags, environment variables, or the session
//! document itself — resolution is entirely this crate's job, so the
//! precedence rule (flag > session snapshot > default) lives here rather
//! than inside the Orchestrator.

use std::path::Path;

use stet_core::ReviewConfig;
use stet_session::SessionStore;
use stet_session_models::ConfigSnapshot;

use crate::cli::{GlobalArgs, StartArgs};

/// The existing session's committed config, if a session has been started.
fn existing_snapshot(repo_root: &Path) -> Option<ConfigSnapshot> {
    let store = SessionStore::new(repo_root.join(".review"));
    let session = store.load().ok()?;
    session.exists().then_some(session.config)
}

/// Build the config for `start`: flags win outright, since there is no
/// prior session to fall back to.
#[must_use]
pub fn for_start(global: &GlobalArgs, args: &StartArgs) -> ReviewConfig {
    ReviewConfig {
        llm_base_url: global.llm_base_url.clone(),
        model: global.model.clone(),
        strictness: args.strictness.clone().unwrap_or_else(|| "default".to_string()),
        nitpicky: args.nitpicky,
        workers: args.workers.unwrap_or_else(|| ReviewConfig::default().workers),
        allow_dirty: args.allow_dirty,
        dry_run: args.dry_run,
        stream: args.stream,
        ..ReviewConfig::default()
    }
}

/// Build the config for `run`/`rerun`: an explicit flag wins, otherwise the
/// session's own committed settings win, otherwise the hardcoded default.
#[must_use]
pub fn for_continuation(
    global: &GlobalArgs,
    repo_root: &Path,
    strictness: Option<&str>,
    nitpicky: bool,
    dry_run: bool,
    stream: bool,
    replace: bool,
) -> ReviewConfig {
    let defaults = ReviewConfig::default();
    let snapshot = existing_snapshot(repo_root);

    let strictness = strictness
        .map(str::to_string)
        .or_else(|| snapshot.as_ref().map(|s| s.strictness.clone()))
        .unwrap_or(defaults.strictness);
    let nitpicky = nitpicky || snapshot.as_ref().is_some_and(|s| s.nitpicky);
    let rag_symbol_max_definitions = snapshot
        .as_ref()
        .and_then(|s| s.rag_symbol_max_definitions)
        .unwrap_or(defaults.rag_symbol_max_definitions);
    let rag_symbol_max_tokens = snapshot
        .as_ref()
        .and_then(|s| s.rag_symbol_max_tokens)
        .unwrap_or(defaults.rag_symbol_max_tokens);
    let context_limit = snapshot
        .as_ref()
        .and_then(|s| s.context_limit)
        .unwrap_or(defaults.context_limit);
    let num_ctx = snapshot
        .as_ref()
        .and_then(|s| s.num_ctx)
        .unwrap_or(defaults.num_ctx);

    ReviewConfig {
        llm_base_url: global.llm_base_url.clone(),
        model: global.model.clone(),
        strictness,
        nitpicky,
        rag_symbol_max_definitions,
        rag_symbol_max_tokens,
        context_limit,
        num_ctx,
        dry_run,
        stream,
        replace,
        ..defaults
    }
}

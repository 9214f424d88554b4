//! The resolved settings a review operation runs with.
//!
//! `stet` has no config-file format of its own: [`ReviewConfig`] is the
//! record a caller (the CLI, or any embedder) assembles from whatever
//! sources it wants — flags, environment, a project dotfile — before
//! handing it to the [`crate::Orchestrator`]. This crate only consumes
//! the resolved record.

use std::path::{Path, PathBuf};
use std::time::Duration;

use stet_session_models::ConfigSnapshot;

/// Resolved configuration for one `stet` invocation.
#[derive(Debug, Clone)]
pub struct ReviewConfig {
    /// Base URL of the local generation endpoint, e.g. `http://localhost:11434`.
    pub llm_base_url: String,
    pub model: String,
    /// A strictness preset name (`strict`, `default`, `lenient`, `+` variants).
    pub strictness: String,
    pub nitpicky: bool,
    /// Size of the per-hunk worker pool.
    pub workers: usize,
    pub rag_symbol_max_definitions: usize,
    pub rag_symbol_max_tokens: usize,
    pub call_graph_max_tokens: usize,
    /// Overall prompt token ceiling. Zero means unbounded.
    pub context_limit: usize,
    /// Emit a warning once a composed context crosses this many tokens.
    pub warn_threshold: usize,
    pub num_ctx: u32,
    pub temperature: f32,
    pub request_timeout: Duration,
    pub grep_timeout: Duration,
    /// How many of the most recent history records to consult for
    /// cross-session suppression.
    pub history_lookback: usize,
    /// Override for the worktree root, default `<repo>/.review/worktrees`.
    pub worktree_root: Option<PathBuf>,
    /// Override for the session state directory, default `<repo>/.review`.
    pub state_dir: Option<PathBuf>,
    pub allow_dirty: bool,
    /// `rerun`'s replace-vs-union merge policy.
    pub replace: bool,
    /// Stub the LLM client with one canned finding per hunk, per `--dry-run`.
    pub dry_run: bool,
    /// Stream `progress`/`finding`/`warning`/`done` as NDJSON instead of a
    /// progress bar.
    pub stream: bool,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            llm_base_url: "http://localhost:11434".to_string(),
            model: "qwen2.5-coder".to_string(),
            strictness: "default".to_string(),
            nitpicky: false,
            workers: 4,
            rag_symbol_max_definitions: 8,
            rag_symbol_max_tokens: 1500,
            call_graph_max_tokens: 1000,
            context_limit: 6000,
            warn_threshold: 4500,
            num_ctx: 4096,
            temperature: 0.2,
            request_timeout: Duration::from_secs(300),
            grep_timeout: Duration::from_secs(5),
            history_lookback: 200,
            worktree_root: None,
            state_dir: None,
            allow_dirty: false,
            replace: false,
            dry_run: false,
            stream: false,
        }
    }
}

impl ReviewConfig {
    /// The session state directory for `repo_root`: the override if one was
    /// set, otherwise `<repo_root>/.review`.
    #[must_use]
    pub fn state_dir(&self, repo_root: &Path) -> PathBuf {
        self.state_dir
            .clone()
            .unwrap_or_else(|| repo_root.join(".review"))
    }

    /// The worktree root for `repo_root`: the override if one was set,
    /// otherwise `<repo_root>/.review/worktrees`.
    #[must_use]
    pub fn worktree_root(&self, repo_root: &Path) -> PathBuf {
        self.worktree_root
            .clone()
            .unwrap_or_else(|| self.state_dir(repo_root).join("worktrees"))
    }

    /// The snapshot of this config persisted alongside a session, so a
    /// later `run` without overrides reuses what `start` committed to.
    #[must_use]
    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            strictness: self.strictness.clone(),
            nitpicky: self.nitpicky,
            rag_symbol_max_definitions: Some(self.rag_symbol_max_definitions),
            rag_symbol_max_tokens: Some(self.rag_symbol_max_tokens),
            context_limit: Some(self.context_limit),
            num_ctx: Some(self.num_ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_dir_defaults_under_repo_root() {
        let config = ReviewConfig::default();
        assert_eq!(
            config.state_dir(Path::new("/repo")),
            PathBuf::from("/repo/.review")
        );
    }

    #[test]
    fn worktree_root_defaults_under_state_dir() {
        let config = ReviewConfig::default();
        assert_eq!(
            config.worktree_root(Path::new("/repo")),
            PathBuf::from("/repo/.review/worktrees")
        );
    }

    #[test]
    fn overrides_win_over_defaults() {
        let config = ReviewConfig {
            state_dir: Some(PathBuf::from("/elsewhere")),
            ..ReviewConfig::default()
        };
        assert_eq!(config.state_dir(Path::new("/repo")), PathBuf::from("/elsewhere"));
    }
}

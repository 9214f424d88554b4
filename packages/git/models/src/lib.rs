#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Data types shared between `stet_git` and its callers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A ref resolved to a stable commit identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRef {
    /// Full commit SHA.
    pub sha: String,
    /// The ref text the caller passed in, kept for error messages.
    pub requested: String,
}

/// One baseline worktree discovered under the configured worktree root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorktreeInfo {
    /// Absolute path to the worktree.
    pub path: String,
    /// The commit it was created from, if `git worktree list --porcelain` reported one.
    pub sha: Option<String>,
    /// True if this worktree matches the current session's baseline.
    pub is_current: bool,
}

/// A single `git grep` match line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrepMatch {
    /// Path relative to the repository root.
    pub file: String,
    /// 1-based line number.
    pub line: u64,
    /// The matched line's content, trimmed of its trailing newline.
    pub content: String,
}

/// Options controlling an uncommitted-tree diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UncommittedDiffOptions {
    /// Only diff the index against HEAD; ignore unstaged changes.
    pub staged_only: bool,
}

#[derive(Debug, Error)]
pub enum GitOpsError {
    #[error("git executable not found or not runnable")]
    NotAvailable,

    #[error("not inside a git repository: {0}")]
    NotARepository(String),

    #[error("git command failed: {0}")]
    CommandFailed(String),

    #[error("could not resolve ref {requested:?}: {reason}")]
    RefUnresolvable {
        requested: String,
        reason: String,
        /// Set when the failure looks like a shallow-clone truncation, so the
        /// caller can suggest passing a concrete SHA instead.
        shallow_hint: bool,
    },

    #[error("{baseline} is not an ancestor of {head}")]
    NotAnAncestor { baseline: String, head: String },

    #[error("worktree already exists at {0}")]
    WorktreeExists(String),

    #[error("worktree not found at {0}")]
    WorktreeNotFound(String),

    #[error("git grep timed out after {0:?}")]
    GrepTimeout(std::time::Duration),

    #[error("operation canceled")]
    Canceled,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

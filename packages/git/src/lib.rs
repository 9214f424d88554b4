#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! A thin capability layer over the `git` executable.
//!
//! Everything that touches a working tree or the object database goes
//! through a subprocess rather than a bindings crate: the CLI refuses to
//! clobber uncommitted changes the way a bindings-based implementation
//! would need to reimplement by hand, and it is the only thing guaranteed
//! to agree with whatever git version the user has installed.

mod cli;

use std::{path::Path, path::PathBuf, time::Duration};

use stet_git_models::{GitOpsError, GrepMatch, ResolvedRef, UncommittedDiffOptions, WorktreeInfo};
use tokio_util::sync::CancellationToken;

pub use cli::GitCli;
pub use stet_git_models::{GitOpsError as Error, GrepMatch as Match};

/// Default hard timeout for a single `git grep` invocation.
pub const GREP_TIMEOUT: Duration = Duration::from_secs(5);

/// Capability surface the orchestrator drives a repository through.
///
/// Implementors must treat `ct` as cooperative: a long-running subprocess
/// is killed, not merely abandoned, when the token is cancelled.
#[async_trait::async_trait]
pub trait GitOps: Send + Sync {
    /// Resolve the repository that contains `cwd`, failing if there is none.
    async fn repo_root(&self, cwd: &Path) -> Result<PathBuf, GitOpsError>;

    /// Resolve `reference` to a commit SHA.
    async fn resolve_ref(
        &self,
        repo_root: &Path,
        reference: &str,
        ct: &CancellationToken,
    ) -> Result<ResolvedRef, GitOpsError>;

    /// Fail with [`GitOpsError::NotAnAncestor`] unless `baseline` is an
    /// ancestor of `head` (or equal to it).
    async fn ancestor_of(
        &self,
        repo_root: &Path,
        baseline: &str,
        head: &str,
        ct: &CancellationToken,
    ) -> Result<(), GitOpsError>;

    /// Materialize a worktree checked out at `sha` under `worktree_root`,
    /// named deterministically from the sha. Fails with
    /// [`GitOpsError::WorktreeExists`] if the target path is already present.
    async fn create_worktree(
        &self,
        repo_root: &Path,
        sha: &str,
        worktree_root: &Path,
        ct: &CancellationToken,
    ) -> Result<PathBuf, GitOpsError>;

    /// Remove a worktree previously created by [`GitOps::create_worktree`].
    async fn remove_worktree(
        &self,
        repo_root: &Path,
        worktree_path: &Path,
        ct: &CancellationToken,
    ) -> Result<(), GitOpsError>;

    /// Enumerate worktrees registered under `worktree_root`.
    async fn list_worktrees(
        &self,
        repo_root: &Path,
        worktree_root: &Path,
        current: Option<&Path>,
        ct: &CancellationToken,
    ) -> Result<Vec<WorktreeInfo>, GitOpsError>;

    /// Unified diff from `base_sha` to the working tree at `head_path`
    /// (including uncommitted changes), with stable, colorless flags.
    async fn diff_to_worktree(
        &self,
        head_path: &Path,
        base_sha: &str,
        ct: &CancellationToken,
    ) -> Result<String, GitOpsError>;

    /// Unified diff between two resolved commits.
    async fn diff_commits(
        &self,
        repo_root: &Path,
        base_sha: &str,
        head_sha: &str,
        ct: &CancellationToken,
    ) -> Result<String, GitOpsError>;

    /// Unified diff of uncommitted changes in `repo_root`.
    async fn uncommitted_diff(
        &self,
        repo_root: &Path,
        opts: UncommittedDiffOptions,
        ct: &CancellationToken,
    ) -> Result<String, GitOpsError>;

    /// `true` if the working tree has any uncommitted changes (staged,
    /// unstaged, or untracked).
    async fn is_dirty(&self, repo_root: &Path, ct: &CancellationToken)
    -> Result<bool, GitOpsError>;

    /// POSIX extended-regex `git grep`, bounded by [`GREP_TIMEOUT`].
    async fn grep(
        &self,
        repo_root: &Path,
        pattern: &str,
        ct: &CancellationToken,
    ) -> Result<Vec<GrepMatch>, GitOpsError>;
}

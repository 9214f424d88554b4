use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    process::{Output, Stdio},
};

use log::debug;
use stet_git_models::{GitOpsError, GrepMatch, ResolvedRef, UncommittedDiffOptions, WorktreeInfo};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::{GREP_TIMEOUT, GitOps};

/// `GitOps` backed by the `git` executable found on `PATH`.
///
/// Every invocation runs with a minimal, scrubbed environment so that the
/// caller's aliases, hooks, pager, and color settings cannot leak into
/// output this crate parses.
#[derive(Clone)]
pub struct GitCli {
    git_binary: OsString,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl GitCli {
    #[must_use]
    pub fn new() -> Self {
        Self {
            git_binary: OsString::from("git"),
        }
    }

    /// Use an explicit path to the `git` executable instead of resolving it
    /// from `PATH` at spawn time.
    #[must_use]
    pub fn with_binary(git_binary: impl Into<OsString>) -> Self {
        Self {
            git_binary: git_binary.into(),
        }
    }

    fn command<I, S>(&self, repo_path: &Path, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.git_binary);
        cmd.env_clear();
        if let Ok(path) = std::env::var("PATH") {
            cmd.env("PATH", path);
        }
        cmd.env("GIT_CONFIG_NOSYSTEM", "1");
        cmd.env("GIT_PAGER", "cat");
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        cmd.env("LC_ALL", "C");
        cmd.arg("-C").arg(repo_path).arg("--no-pager");
        for arg in args {
            cmd.arg(arg);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);
        cmd
    }

    async fn spawn_capture(
        &self,
        repo_path: &Path,
        args: impl IntoIterator<Item = impl AsRef<OsStr>>,
        extra_env: &[(&str, &OsStr)],
        ct: &CancellationToken,
    ) -> Result<Output, GitOpsError> {
        let mut cmd = self.command(repo_path, args);
        for (k, v) in extra_env {
            cmd.env(k, v);
        }
        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GitOpsError::NotAvailable
            } else {
                GitOpsError::CommandFailed(e.to_string())
            }
        })?;
        tokio::select! {
            biased;
            () = ct.cancelled() => Err(GitOpsError::Canceled),
            res = child.wait_with_output() => res.map_err(|e| GitOpsError::CommandFailed(e.to_string())),
        }
    }

    /// Run `git <args>` in `repo_path`, returning stdout as text on success.
    async fn run<I, S>(
        &self,
        repo_path: &Path,
        args: I,
        ct: &CancellationToken,
    ) -> Result<String, GitOpsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let out = self.spawn_capture(repo_path, args, &[], ct).await?;
        if out.status.success() {
            Ok(String::from_utf8_lossy(&out.stdout).into_owned())
        } else {
            Err(GitOpsError::CommandFailed(
                String::from_utf8_lossy(&out.stderr).trim().to_string(),
            ))
        }
    }

    /// Unified diff between `base_ref` and the working tree at `repo_path`.
    ///
    /// When `include_untracked` is set this stages everything (tracked and
    /// untracked) into a throwaway index so untracked files participate in
    /// the diff without touching the caller's real index.
    async fn diff_against(
        &self,
        repo_path: &Path,
        base_ref: &str,
        include_untracked: bool,
        ct: &CancellationToken,
    ) -> Result<String, GitOpsError> {
        if !include_untracked {
            return self
                .run(repo_path, ["diff", "--no-color", "--cached", base_ref], ct)
                .await;
        }

        let tmp_dir = tempfile::TempDir::new().map_err(GitOpsError::Io)?;
        let tmp_index = tmp_dir.path().join("index");
        let env = [("GIT_INDEX_FILE", tmp_index.as_os_str())];

        let out = self
            .spawn_capture(repo_path, ["read-tree", base_ref], &env, ct)
            .await?;
        if !out.status.success() {
            return Err(GitOpsError::CommandFailed(
                String::from_utf8_lossy(&out.stderr).trim().to_string(),
            ));
        }

        let out = self
            .spawn_capture(repo_path, ["add", "-A"], &env, ct)
            .await?;
        if !out.status.success() {
            return Err(GitOpsError::CommandFailed(
                String::from_utf8_lossy(&out.stderr).trim().to_string(),
            ));
        }

        let out = self
            .spawn_capture(
                repo_path,
                ["diff", "--no-color", "--cached", base_ref],
                &env,
                ct,
            )
            .await?;
        if out.status.success() {
            Ok(String::from_utf8_lossy(&out.stdout).into_owned())
        } else {
            Err(GitOpsError::CommandFailed(
                String::from_utf8_lossy(&out.stderr).trim().to_string(),
            ))
        }
    }

    fn parse_worktree_list(output: &str, worktree_root: &Path, current: Option<&Path>) -> Vec<WorktreeInfo> {
        let mut infos = Vec::new();
        let mut path: Option<PathBuf> = None;
        let mut sha: Option<String> = None;

        let flush = |path: &mut Option<PathBuf>, sha: &mut Option<String>, infos: &mut Vec<WorktreeInfo>| {
            if let Some(p) = path.take() {
                let name_is_stet = p
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("stet-"));
                if p.starts_with(worktree_root) && name_is_stet {
                    let is_current = current.is_some_and(|c| c == p);
                    infos.push(WorktreeInfo {
                        path: p.display().to_string(),
                        sha: sha.take(),
                        is_current,
                    });
                }
            }
            *sha = None;
        };

        for line in output.lines() {
            if let Some(p) = line.strip_prefix("worktree ") {
                flush(&mut path, &mut sha, &mut infos);
                path = Some(PathBuf::from(p));
            } else if let Some(h) = line.strip_prefix("HEAD ") {
                sha = Some(h.to_string());
            } else if line.is_empty() {
                flush(&mut path, &mut sha, &mut infos);
            }
        }
        flush(&mut path, &mut sha, &mut infos);
        infos
    }
}

#[async_trait::async_trait]
impl GitOps for GitCli {
    async fn repo_root(&self, cwd: &Path) -> Result<PathBuf, GitOpsError> {
        let ct = CancellationToken::new();
        let out = self
            .run(cwd, ["rev-parse", "--show-toplevel"], &ct)
            .await
            .map_err(|_| GitOpsError::NotARepository(cwd.display().to_string()))?;
        Ok(PathBuf::from(out.trim()))
    }

    async fn resolve_ref(
        &self,
        repo_root: &Path,
        reference: &str,
        ct: &CancellationToken,
    ) -> Result<ResolvedRef, GitOpsError> {
        let spec = format!("{reference}^{{commit}}");
        match self.run(repo_root, ["rev-parse", "--verify", &spec], ct).await {
            Ok(sha) => Ok(ResolvedRef {
                sha: sha.trim().to_string(),
                requested: reference.to_string(),
            }),
            Err(GitOpsError::CommandFailed(reason)) => {
                let shallow_hint = self
                    .run(repo_root, ["rev-parse", "--is-shallow-repository"], ct)
                    .await
                    .map(|s| s.trim() == "true")
                    .unwrap_or(false);
                Err(GitOpsError::RefUnresolvable {
                    requested: reference.to_string(),
                    reason,
                    shallow_hint,
                })
            }
            Err(other) => Err(other),
        }
    }

    async fn ancestor_of(
        &self,
        repo_root: &Path,
        baseline: &str,
        head: &str,
        ct: &CancellationToken,
    ) -> Result<(), GitOpsError> {
        let out = self
            .spawn_capture(
                repo_root,
                ["merge-base", "--is-ancestor", baseline, head],
                &[],
                ct,
            )
            .await?;
        match out.status.code() {
            Some(0) => Ok(()),
            Some(1) => Err(GitOpsError::NotAnAncestor {
                baseline: baseline.to_string(),
                head: head.to_string(),
            }),
            _ => Err(GitOpsError::CommandFailed(
                String::from_utf8_lossy(&out.stderr).trim().to_string(),
            )),
        }
    }

    async fn create_worktree(
        &self,
        repo_root: &Path,
        sha: &str,
        worktree_root: &Path,
        ct: &CancellationToken,
    ) -> Result<PathBuf, GitOpsError> {
        let path = worktree_root.join(format!("stet-{sha}"));
        if tokio::fs::metadata(&path).await.is_ok() {
            return Err(GitOpsError::WorktreeExists(path.display().to_string()));
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(GitOpsError::Io)?;
        }
        debug!("creating worktree at {}", path.display());
        self.run(
            repo_root,
            [
                OsStr::new("worktree"),
                OsStr::new("add"),
                OsStr::new("--detach"),
                path.as_os_str(),
                OsStr::new(sha),
            ],
            ct,
        )
        .await?;
        Ok(path)
    }

    async fn remove_worktree(
        &self,
        repo_root: &Path,
        worktree_path: &Path,
        ct: &CancellationToken,
    ) -> Result<(), GitOpsError> {
        if tokio::fs::metadata(worktree_path).await.is_err() {
            return Err(GitOpsError::WorktreeNotFound(
                worktree_path.display().to_string(),
            ));
        }
        self.run(
            repo_root,
            [
                OsStr::new("worktree"),
                OsStr::new("remove"),
                OsStr::new("--force"),
                worktree_path.as_os_str(),
            ],
            ct,
        )
        .await?;
        let _ = self.run(repo_root, ["worktree", "prune"], ct).await;
        Ok(())
    }

    async fn list_worktrees(
        &self,
        repo_root: &Path,
        worktree_root: &Path,
        current: Option<&Path>,
        ct: &CancellationToken,
    ) -> Result<Vec<WorktreeInfo>, GitOpsError> {
        let out = self
            .run(repo_root, ["worktree", "list", "--porcelain"], ct)
            .await?;
        Ok(Self::parse_worktree_list(&out, worktree_root, current))
    }

    async fn diff_to_worktree(
        &self,
        head_path: &Path,
        base_sha: &str,
        ct: &CancellationToken,
    ) -> Result<String, GitOpsError> {
        self.diff_against(head_path, base_sha, true, ct).await
    }

    async fn diff_commits(
        &self,
        repo_root: &Path,
        base_sha: &str,
        head_sha: &str,
        ct: &CancellationToken,
    ) -> Result<String, GitOpsError> {
        self.run(repo_root, ["diff", "--no-color", base_sha, head_sha], ct)
            .await
    }

    async fn uncommitted_diff(
        &self,
        repo_root: &Path,
        opts: UncommittedDiffOptions,
        ct: &CancellationToken,
    ) -> Result<String, GitOpsError> {
        self.diff_against(repo_root, "HEAD", !opts.staged_only, ct)
            .await
    }

    async fn is_dirty(
        &self,
        repo_root: &Path,
        ct: &CancellationToken,
    ) -> Result<bool, GitOpsError> {
        let out = self
            .run(repo_root, ["status", "--porcelain"], ct)
            .await?;
        Ok(!out.trim().is_empty())
    }

    async fn grep(
        &self,
        repo_root: &Path,
        pattern: &str,
        ct: &CancellationToken,
    ) -> Result<Vec<GrepMatch>, GitOpsError> {
        let fut = self.run(
            repo_root,
            ["grep", "-n", "-E", "--no-color", "-e", pattern],
            ct,
        );
        let out = match tokio::time::timeout(GREP_TIMEOUT, fut).await {
            Ok(res) => res,
            Err(_) => return Err(GitOpsError::GrepTimeout(GREP_TIMEOUT)),
        };
        let text = match out {
            Ok(text) => text,
            // `git grep` exits 1 with empty output when nothing matches.
            Err(GitOpsError::CommandFailed(reason)) if reason.is_empty() => String::new(),
            Err(e) => return Err(e),
        };
        Ok(parse_grep_output(&text))
    }
}

fn parse_grep_output(output: &str) -> Vec<GrepMatch> {
    let mut matches = Vec::new();
    for line in output.lines() {
        let mut parts = line.splitn(3, ':');
        let (Some(file), Some(line_no), Some(content)) =
            (parts.next(), parts.next(), parts.next())
        else {
            continue;
        };
        let Ok(line_no) = line_no.parse::<u64>() else {
            continue;
        };
        matches.push(GrepMatch {
            file: file.to_string(),
            line: line_no,
            content: content.to_string(),
        });
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command as StdCommand;

    fn init_repo() -> tempfile::TempDir {
        let dir = tempfile::TempDir::new().unwrap();
        let run = |args: &[&str]| {
            let status = StdCommand::new("git")
                .arg("-C")
                .arg(dir.path())
                .args(args)
                .status()
                .unwrap();
            assert!(status.success(), "git {args:?} failed");
        };
        run(&["init", "-q"]);
        run(&["config", "user.email", "test@example.com"]);
        run(&["config", "user.name", "Test"]);
        std::fs::write(dir.path().join("f1.txt"), "hello\n").unwrap();
        run(&["add", "."]);
        run(&["commit", "-q", "-m", "initial"]);
        dir
    }

    #[tokio::test]
    async fn resolve_ref_finds_head() {
        let dir = init_repo();
        let git = GitCli::new();
        let ct = CancellationToken::new();
        let resolved = git.resolve_ref(dir.path(), "HEAD", &ct).await.unwrap();
        assert_eq!(resolved.sha.len(), 40);
    }

    #[tokio::test]
    async fn resolve_ref_unresolvable_reports_reason() {
        let dir = init_repo();
        let git = GitCli::new();
        let ct = CancellationToken::new();
        let err = git.resolve_ref(dir.path(), "not-a-ref", &ct).await.unwrap_err();
        assert!(matches!(err, GitOpsError::RefUnresolvable { .. }));
    }

    #[tokio::test]
    async fn ancestor_of_accepts_self() {
        let dir = init_repo();
        let git = GitCli::new();
        let ct = CancellationToken::new();
        let head = git.resolve_ref(dir.path(), "HEAD", &ct).await.unwrap();
        git.ancestor_of(dir.path(), &head.sha, &head.sha, &ct)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn ancestor_of_rejects_descendant_as_baseline() {
        let dir = init_repo();
        let git = GitCli::new();
        let ct = CancellationToken::new();
        let first = git.resolve_ref(dir.path(), "HEAD", &ct).await.unwrap();
        std::fs::write(dir.path().join("f2.txt"), "world\n").unwrap();
        StdCommand::new("git")
            .arg("-C")
            .arg(dir.path())
            .args(["add", "."])
            .status()
            .unwrap();
        StdCommand::new("git")
            .arg("-C")
            .arg(dir.path())
            .args(["commit", "-q", "-m", "second"])
            .status()
            .unwrap();
        let head = git.resolve_ref(dir.path(), "HEAD", &ct).await.unwrap();
        let err = git
            .ancestor_of(dir.path(), &head.sha, &first.sha, &ct)
            .await
            .unwrap_err();
        assert!(matches!(err, GitOpsError::NotAnAncestor { .. }));
    }

    #[tokio::test]
    async fn create_and_remove_worktree_roundtrips() {
        let dir = init_repo();
        let git = GitCli::new();
        let ct = CancellationToken::new();
        let head = git.resolve_ref(dir.path(), "HEAD", &ct).await.unwrap();
        let worktree_root = dir.path().join(".review").join("worktrees");
        let path = git
            .create_worktree(dir.path(), &head.sha, &worktree_root, &ct)
            .await
            .unwrap();
        assert!(path.exists());

        let again = git
            .create_worktree(dir.path(), &head.sha, &worktree_root, &ct)
            .await;
        assert!(matches!(again, Err(GitOpsError::WorktreeExists(_))));

        let listed = git
            .list_worktrees(dir.path(), &worktree_root, Some(&path), &ct)
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].is_current);

        git.remove_worktree(dir.path(), &path, &ct).await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn uncommitted_diff_includes_untracked_files() {
        let dir = init_repo();
        let git = GitCli::new();
        let ct = CancellationToken::new();
        std::fs::write(dir.path().join("new.txt"), "fresh\n").unwrap();
        let diff = git
            .uncommitted_diff(dir.path(), UncommittedDiffOptions::default(), &ct)
            .await
            .unwrap();
        assert!(diff.contains("new.txt"));
        assert!(git.is_dirty(dir.path(), &ct).await.unwrap());
    }

    #[tokio::test]
    async fn grep_finds_matches() {
        let dir = init_repo();
        let git = GitCli::new();
        let ct = CancellationToken::new();
        let matches = git.grep(dir.path(), "hello", &ct).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].file, "f1.txt");
        assert_eq!(matches[0].line, 1);
    }

    #[tokio::test]
    async fn grep_with_no_matches_is_empty() {
        let dir = init_repo();
        let git = GitCli::new();
        let ct = CancellationToken::new();
        let matches = git.grep(dir.path(), "definitely-not-present", &ct).await.unwrap();
        assert!(matches.is_empty());
    }
}

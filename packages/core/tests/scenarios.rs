//! End-to-end lifecycle tests driving [`Orchestrator`] against a real git
//! repository (via `stet_git::GitCli`) and the in-process
//! [`DryRunLlmClient`], the same way `stet_git`'s own tests drive real git
//! subprocesses against a throwaway repository rather than mocking them.

use std::process::Command as StdCommand;
use std::sync::Arc;

use stet_core::{CoreError, DryRunLlmClient, EventSink, Orchestrator, ReviewConfig, RunStats};
use stet_findings_models::Finding;
use stet_git::{GitCli, GitOps};
use stet_llm::OllamaClient;
use stet_rag::SymbolResolverRegistry;
use tokio_util::sync::CancellationToken;

struct NullSink;

impl EventSink for NullSink {
    fn progress(&mut self, _hunk: usize, _total: usize, _file: &str) {}
    fn finding(&mut self, _finding: &Finding) {}
    fn warning(&mut self, _message: &str) {}
    fn done(&mut self, _stats: &RunStats) {}
}

fn run_git(dir: &std::path::Path, args: &[&str]) {
    let status = StdCommand::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .status()
        .unwrap();
    assert!(status.success(), "git {args:?} failed");
}

/// A two-commit repository: `f1.txt` at `HEAD~1`, `f2.txt` added at `HEAD`.
fn init_repo() -> tempfile::TempDir {
    let dir = tempfile::TempDir::new().unwrap();
    run_git(dir.path(), &["init", "-q"]);
    run_git(dir.path(), &["config", "user.email", "test@example.com"]);
    run_git(dir.path(), &["config", "user.name", "Test"]);
    std::fs::write(dir.path().join("f1.txt"), "hello\n").unwrap();
    run_git(dir.path(), &["add", "."]);
    run_git(dir.path(), &["commit", "-q", "-m", "first"]);
    std::fs::write(dir.path().join("f2.txt"), "world\n").unwrap();
    run_git(dir.path(), &["add", "."]);
    run_git(dir.path(), &["commit", "-q", "-m", "second"]);
    dir
}

fn orchestrator(repo_root: &std::path::Path, config: ReviewConfig) -> Orchestrator {
    Orchestrator::new(
        repo_root.to_path_buf(),
        Arc::new(GitCli::new()),
        Arc::new(DryRunLlmClient),
        Arc::new(SymbolResolverRegistry::with_defaults()),
        Box::new(NullSink),
        config,
    )
}

fn config_for(repo: &tempfile::TempDir) -> ReviewConfig {
    ReviewConfig {
        state_dir: Some(repo.path().join(".review")),
        ..ReviewConfig::default()
    }
}

#[tokio::test]
async fn fresh_start_produces_a_session_and_a_baseline_worktree() {
    let repo = init_repo();
    let git = GitCli::new();
    let ct = CancellationToken::new();
    let head_minus_one = git.resolve_ref(repo.path(), "HEAD~1", &ct).await.unwrap();

    let mut orch = orchestrator(repo.path(), config_for(&repo));
    let stats = orch.start("HEAD~1", &ct).await.unwrap();
    assert!(stats.count >= 1);

    let session_path = repo.path().join(".review/session.json");
    assert!(session_path.exists());
    let text = std::fs::read_to_string(&session_path).unwrap();
    assert!(text.contains(&head_minus_one.sha));

    let worktree_path = repo
        .path()
        .join(".review/worktrees")
        .join(format!("stet-{}", head_minus_one.sha));
    assert!(worktree_path.is_dir());
}

#[tokio::test]
async fn finish_deletes_the_session_and_the_worktree() {
    let repo = init_repo();
    let ct = CancellationToken::new();
    let mut orch = orchestrator(repo.path(), config_for(&repo));
    orch.start("HEAD~1", &ct).await.unwrap();

    orch.finish(&ct).await.unwrap();

    assert!(!repo.path().join(".review/session.json").exists());
    let worktrees_dir = repo.path().join(".review/worktrees");
    let remaining = std::fs::read_dir(&worktrees_dir)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn dismissed_finding_does_not_resurface_after_rerun() {
    let repo = init_repo();
    let ct = CancellationToken::new();
    let mut orch = orchestrator(repo.path(), config_for(&repo));
    orch.start("HEAD~1", &ct).await.unwrap();

    let active = orch.list().unwrap();
    assert!(!active.is_empty());
    let id = active[0].id.clone();

    orch.dismiss(&id[..8], Some("false_positive".to_string())).unwrap();

    let history_path = repo.path().join(".review/history.jsonl");
    let history = std::fs::read_to_string(&history_path).unwrap();
    assert_eq!(history.lines().count(), 1);
    assert!(history.contains(&id));

    orch.rerun(&ct).await.unwrap();
    let active_after = orch.list().unwrap();
    assert!(!active_after.iter().any(|f| f.id == id));
}

#[tokio::test]
async fn dirty_worktree_blocks_start_unless_allowed() {
    let repo = init_repo();
    std::fs::write(repo.path().join("f1.txt"), "modified\n").unwrap();
    let ct = CancellationToken::new();

    let mut orch = orchestrator(repo.path(), config_for(&repo));
    let err = orch.start("HEAD~1", &ct).await.unwrap_err();
    assert!(matches!(err, CoreError::DirtyWorktree));
    assert!(err.hint().unwrap().contains("Commit or stash"));

    let mut allowing = orchestrator(
        repo.path(),
        ReviewConfig {
            allow_dirty: true,
            ..config_for(&repo)
        },
    );
    allowing.start("HEAD~1", &ct).await.unwrap();
}

#[tokio::test]
async fn starting_twice_on_the_same_baseline_reports_worktree_exists() {
    let repo = init_repo();
    let ct = CancellationToken::new();

    let mut first = orchestrator(repo.path(), config_for(&repo));
    first.start("HEAD~1", &ct).await.unwrap();

    let mut second = orchestrator(repo.path(), config_for(&repo));
    let err = second.start("HEAD~1", &ct).await.unwrap_err();
    assert!(matches!(err, CoreError::WorktreeExists(_)));
    assert!(err.hint().unwrap().contains("stet finish"));
}

#[tokio::test]
async fn unreachable_llm_server_aborts_start_with_a_transport_error() {
    let repo = init_repo();
    let ct = CancellationToken::new();

    let config = config_for(&repo);
    let mut orch = Orchestrator::new(
        repo.path().to_path_buf(),
        Arc::new(GitCli::new()),
        Arc::new(OllamaClient::new(
            "http://127.0.0.1:1".to_string(),
            std::time::Duration::from_secs(2),
        )),
        Arc::new(SymbolResolverRegistry::with_defaults()),
        Box::new(NullSink),
        config,
    );

    let err = orch.start("HEAD~1", &ct).await.unwrap_err();
    assert!(matches!(err, CoreError::LlmUnreachable(_)));
}

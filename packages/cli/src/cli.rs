//! Argument grammar. Kept separate from `main` so `config` can depend on
//! the arg structs without pulling in the dispatch logic.

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "stet", version, about = "A local-first, git-diff-driven code review runner", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Base URL of the local generation endpoint.
    #[arg(long, env = "STET_LLM_BASE_URL", default_value = "http://localhost:11434", global = true)]
    pub llm_base_url: String,

    /// Model name to request from the generation endpoint.
    #[arg(long, env = "STET_MODEL", default_value = "qwen2.5-coder", global = true)]
    pub model: String,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start a new review session against a baseline ref.
    Start(StartArgs),
    /// Review hunks introduced since the last run of this session.
    Run(RunArgs),
    /// Re-review every hunk in the session's current diff.
    Rerun(RerunArgs),
    /// Remove the baseline worktree and delete the session.
    Finish,
    /// Remove every orphaned baseline worktree.
    Cleanup,
    /// Dismiss a finding by id or unambiguous id prefix.
    Dismiss(DismissArgs),
    /// Print a summary of the current session.
    Status,
    /// List active (non-dismissed) findings.
    List(ListArgs),
    /// Verify the LLM server is reachable and the configured model is present.
    Doctor,
}

#[derive(Args)]
pub struct StartArgs {
    /// The baseline git ref to diff against, e.g. `HEAD~1` or `main`.
    pub reference: String,

    /// Stub the LLM with one canned finding per hunk instead of calling a real server.
    #[arg(long)]
    pub dry_run: bool,

    /// Proceed even if the working tree has uncommitted changes.
    #[arg(long)]
    pub allow_dirty: bool,

    /// Emit NDJSON progress/finding/warning/done events instead of a progress bar.
    #[arg(long)]
    pub stream: bool,

    /// Strictness preset: `strict`, `default`, or `lenient`.
    #[arg(long)]
    pub strictness: Option<String>,

    /// Surface lower-confidence, stylistic findings as well.
    #[arg(long)]
    pub nitpicky: bool,

    /// Size of the per-hunk worker pool.
    #[arg(long)]
    pub workers: Option<usize>,
}

#[derive(Args)]
pub struct RunArgs {
    #[arg(long)]
    pub stream: bool,
    #[arg(long)]
    pub dry_run: bool,
    #[arg(long)]
    pub strictness: Option<String>,
    #[arg(long)]
    pub nitpicky: bool,
}

#[derive(Args)]
pub struct RerunArgs {
    /// Drop every existing finding in favor of this run's results, rather
    /// than merging the fresh batch in alongside what is already there.
    #[arg(long)]
    pub replace: bool,
    #[arg(long)]
    pub stream: bool,
    #[arg(long)]
    pub dry_run: bool,
    #[arg(long)]
    pub strictness: Option<String>,
    #[arg(long)]
    pub nitpicky: bool,
}

#[derive(Args)]
pub struct DismissArgs {
    /// A finding id, or an unambiguous hex prefix of one.
    pub id_or_prefix: String,
    #[arg(long)]
    pub reason: Option<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Only show findings at or above this severity (`info`, `warning`, `error`).
    #[arg(long)]
    pub severity: Option<String>,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn start_parses_reference_and_flags() {
        let cli = Cli::try_parse_from([
            "stet", "start", "HEAD~1", "--dry-run", "--allow-dirty", "--workers", "2",
        ])
        .unwrap();
        match cli.command {
            Command::Start(args) => {
                assert_eq!(args.reference, "HEAD~1");
                assert!(args.dry_run);
                assert!(args.allow_dirty);
                assert_eq!(args.workers, Some(2));
            }
            _ => panic!("expected Start"),
        }
    }

    #[test]
    fn dismiss_requires_an_id() {
        assert!(Cli::try_parse_from(["stet", "dismiss"]).is_err());
        let cli = Cli::try_parse_from(["stet", "dismiss", "abc123", "--reason", "false positive"]).unwrap();
        match cli.command {
            Command::Dismiss(args) => {
                assert_eq!(args.id_or_prefix, "abc123");
                assert_eq!(args.reason.as_deref(), Some("false positive"));
            }
            _ => panic!("expected Dismiss"),
        }
    }

    #[test]
    fn global_flags_default_without_env() {
        let cli = Cli::try_parse_from(["stet", "status"]).unwrap();
        assert_eq!(cli.global.llm_base_url, "http://localhost:11434");
        assert_eq!(cli.global.model, "qwen2.5-coder");
    }

    #[test]
    fn rerun_replace_flag_parses() {
        let cli = Cli::try_parse_from(["stet", "rerun", "--replace"]).unwrap();
        match cli.command {
            Command::Rerun(args) => assert!(args.replace),
            _ => panic!("expected Rerun"),
        }
    }
}

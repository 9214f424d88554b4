#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! The `stet` binary: argument parsing, config resolution, and wiring the
//! Orchestrator's collaborators to a terminal. No review logic lives here
//! — everything in this crate is parse, resolve, construct, dispatch,
//! render.

mod cli;
mod config;
mod report;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use stet_core::{CoreError, DryRunLlmClient, EventSink, NdjsonSink, Orchestrator, TtyProgressSink};
use stet_findings_models::Severity;
use stet_git::{GitCli, GitOps};
use stet_llm::{LlmClient, OllamaClient};
use stet_rag::SymbolResolverRegistry;
use tokio_util::sync::CancellationToken;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    match try_main().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast::<CoreError>() {
            Ok(core_err) => {
                eprintln!("{}", report::render(&core_err));
                ExitCode::from(u8::try_from(core_err.exit_code()).unwrap_or(1))
            }
            Err(other) => {
                eprintln!("error: {other:#}");
                ExitCode::FAILURE
            }
        },
    }
}

async fn try_main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let ct = CancellationToken::new();
    let signal_ct = ct.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("received interrupt, cancelling in-flight work");
            signal_ct.cancel();
        }
    });

    let git: Arc<dyn GitOps> = Arc::new(GitCli::new());
    let cwd = std::env::current_dir().context("could not determine the current directory")?;
    let repo_root = git
        .repo_root(&cwd)
        .await
        .context("could not locate a git repository")?;

    dispatch(&cli, &git, &repo_root, &ct).await?;
    Ok(())
}

fn sink(stream: bool) -> Box<dyn EventSink> {
    if stream {
        Box::new(NdjsonSink::new(std::io::stdout()))
    } else {
        Box::new(TtyProgressSink)
    }
}

fn llm_client(dry_run: bool, base_url: &str, timeout: std::time::Duration) -> Arc<dyn LlmClient> {
    if dry_run {
        Arc::new(DryRunLlmClient)
    } else {
        Arc::new(OllamaClient::new(base_url.to_string(), timeout))
    }
}

async fn dispatch(
    cli: &Cli,
    git: &Arc<dyn GitOps>,
    repo_root: &std::path::Path,
    ct: &CancellationToken,
) -> Result<(), CoreError> {
    let registry = Arc::new(SymbolResolverRegistry::with_defaults());

    match &cli.command {
        Command::Start(args) => {
            let config = config::for_start(&cli.global, args);
            let llm = llm_client(config.dry_run, &config.llm_base_url, config.request_timeout);
            let mut orchestrator = Orchestrator::new(
                repo_root.to_path_buf(),
                Arc::clone(git),
                llm,
                Arc::clone(&registry),
                sink(config.stream),
                config,
            );
            orchestrator.start(&args.reference, ct).await?;
        }
        Command::Run(args) => {
            let config = config::for_continuation(
                &cli.global,
                repo_root,
                args.strictness.as_deref(),
                args.nitpicky,
                args.dry_run,
                args.stream,
                false,
            );
            let llm = llm_client(config.dry_run, &config.llm_base_url, config.request_timeout);
            let mut orchestrator = Orchestrator::new(
                repo_root.to_path_buf(),
                Arc::clone(git),
                llm,
                Arc::clone(&registry),
                sink(config.stream),
                config,
            );
            orchestrator.run(ct).await?;
        }
        Command::Rerun(args) => {
            let config = config::for_continuation(
                &cli.global,
                repo_root,
                args.strictness.as_deref(),
                args.nitpicky,
                args.dry_run,
                args.stream,
                args.replace,
            );
            let llm = llm_client(config.dry_run, &config.llm_base_url, config.request_timeout);
            let mut orchestrator = Orchestrator::new(
                repo_root.to_path_buf(),
                Arc::clone(git),
                llm,
                Arc::clone(&registry),
                sink(config.stream),
                config,
            );
            orchestrator.rerun(ct).await?;
        }
        Command::Finish => {
            let config = config::for_continuation(&cli.global, repo_root, None, false, false, false, false);
            let llm = llm_client(false, &config.llm_base_url, config.request_timeout);
            let mut orchestrator = Orchestrator::new(
                repo_root.to_path_buf(),
                Arc::clone(git),
                llm,
                Arc::clone(&registry),
                sink(false),
                config,
            );
            orchestrator.finish(ct).await?;
            println!("session finished");
        }
        Command::Cleanup => {
            let config = config::for_continuation(&cli.global, repo_root, None, false, false, false, false);
            let llm = llm_client(false, &config.llm_base_url, config.request_timeout);
            let orchestrator = Orchestrator::new(
                repo_root.to_path_buf(),
                Arc::clone(git),
                llm,
                Arc::clone(&registry),
                sink(false),
                config,
            );
            let removed = orchestrator.cleanup(ct).await?;
            println!("removed {removed} worktree(s)");
        }
        Command::Dismiss(args) => {
            let config = config::for_continuation(&cli.global, repo_root, None, false, false, false, false);
            let llm = llm_client(false, &config.llm_base_url, config.request_timeout);
            let mut orchestrator = Orchestrator::new(
                repo_root.to_path_buf(),
                Arc::clone(git),
                llm,
                Arc::clone(&registry),
                sink(false),
                config,
            );
            orchestrator.dismiss(&args.id_or_prefix, args.reason.clone())?;
            println!("dismissed {}", args.id_or_prefix);
        }
        Command::Status => {
            let config = config::for_continuation(&cli.global, repo_root, None, false, false, false, false);
            let llm = llm_client(false, &config.llm_base_url, config.request_timeout);
            let orchestrator = Orchestrator::new(
                repo_root.to_path_buf(),
                Arc::clone(git),
                llm,
                Arc::clone(&registry),
                sink(false),
                config,
            );
            let view = orchestrator.status()?;
            print_status(&view);
        }
        Command::List(args) => {
            let config = config::for_continuation(&cli.global, repo_root, None, false, false, false, false);
            let llm = llm_client(false, &config.llm_base_url, config.request_timeout);
            let orchestrator = Orchestrator::new(
                repo_root.to_path_buf(),
                Arc::clone(git),
                llm,
                Arc::clone(&registry),
                sink(false),
                config,
            );
            let threshold = args
                .severity
                .as_deref()
                .map(parse_severity)
                .transpose()?
                .unwrap_or(Severity::Info);
            for finding in orchestrator.list()? {
                if finding.severity >= threshold {
                    println!(
                        "{} {}:{} [{}] {}",
                        &finding.id[..finding.id.len().min(8)],
                        finding.file,
                        finding.line,
                        finding.severity.as_str(),
                        finding.message
                    );
                }
            }
        }
        Command::Doctor => {
            let llm = llm_client(false, &cli.global.llm_base_url, std::time::Duration::from_secs(10));
            llm.ensure_model_present(&cli.global.model, ct)
                .await
                .map_err(CoreError::from)?;
            println!(
                "ok: {} is reachable and model {:?} is present",
                cli.global.llm_base_url, cli.global.model
            );
        }
    }
    Ok(())
}

fn print_status(view: &stet_session_models::SessionView) {
    if view.baseline_ref.is_empty() {
        println!("no review session in progress");
        return;
    }
    println!("baseline: {}", view.baseline_ref);
    match view.last_reviewed_at {
        Some(at) => println!("last reviewed: {at}"),
        None => println!("last reviewed: never"),
    }
    println!("active findings: {}", view.active_finding_count);
    println!("dismissed: {}", view.dismissed_count);
    println!("strictness: {}", view.config.strictness);
}

fn parse_severity(text: &str) -> Result<Severity, CoreError> {
    match text.to_lowercase().as_str() {
        "info" => Ok(Severity::Info),
        "warning" => Ok(Severity::Warning),
        "error" => Ok(Severity::Error),
        other => Err(CoreError::InvalidInput(format!(
            "unknown severity {other:?}; expected info, warning, or error"
        ))),
    }
}

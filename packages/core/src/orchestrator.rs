//! The top-level operations: `start`, `run`, `rerun`, `finish`, `cleanup`,
//! `dismiss`, `status`, `list`.
//!
//! The Orchestrator is the only place cross-subsystem coordination
//! happens — `SessionStore` stays a pure load/save layer and
//! `stet_findings` stays a pure value transformer; everything that ties
//! git, the model, RAG context assembly, and persistence together lives
//! here, constructed explicitly from its collaborators rather than
//! reaching for package-scope state.

use std::collections::HashMap;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use futures::StreamExt;
use stet_diff_models::Hunk;
use stet_findings::{MergeMode, StrictnessPreset, merge, run_pipeline, suppress};
use stet_findings_models::Finding;
use stet_git::GitOps;
use stet_llm::{LlmClient, LlmError};
use stet_llm_models::{GenerateOptions, GenerateRequest};
use stet_rag::{BuiltContext, ContextBudget, ResolveOptions, SymbolResolverRegistry, callgraph::CallGraphOptions};
use stet_session::{HistoryLog, SessionStore};
use stet_session_models::{HistoryRecord, PromptShadow, Session, SessionView};
use tokio_util::sync::CancellationToken;

use crate::config::ReviewConfig;
use crate::error::CoreError;
use crate::prompts;
use crate::sink::{EventSink, RunStats};

/// Drives one repository's review lifecycle. Constructed with every
/// collaborator it needs; nothing here is reached for through global state.
pub struct Orchestrator {
    repo_root: PathBuf,
    git: Arc<dyn GitOps>,
    llm: Arc<dyn LlmClient>,
    registry: Arc<SymbolResolverRegistry>,
    store: SessionStore,
    history: HistoryLog,
    sink: Box<dyn EventSink>,
    config: ReviewConfig,
}

/// Outcome of reviewing one hunk: its findings, any warnings, and enough
/// of the prompt/response to populate `finding_prompt_context` and the
/// session's prompt shadow.
struct HunkOutcome {
    file: String,
    fingerprint: String,
    findings: Vec<Finding>,
    warnings: Vec<String>,
    prompt: String,
    raw_response_excerpt: String,
    prompt_tokens: u64,
    completion_tokens: u64,
    eval_duration_ns: u64,
}

/// Aggregate result of reviewing a batch of hunks concurrently.
struct ReviewBatch {
    findings: Vec<Finding>,
    fingerprints: Vec<String>,
    finding_prompt_context: HashMap<String, String>,
    prompt_shadows: Vec<PromptShadow>,
    stats: RunStats,
}

fn sort_hunks(hunks: &mut [Hunk]) {
    hunks.sort_by(|a, b| a.file.cmp(&b.file).then(a.old_start.cmp(&b.old_start)));
}

/// Assemble context, prompt the model, and run the findings pipeline for
/// one hunk. LLM transport failures (`Unreachable`, `BadRequest`) abort by
/// returning `Err`; everything else — a malformed response, a resolver
/// timeout, a parse miss — degrades to a warning so one bad hunk never
/// aborts the whole run.
async fn review_hunk(
    git: Arc<dyn GitOps>,
    registry: Arc<SymbolResolverRegistry>,
    llm: Arc<dyn LlmClient>,
    repo_root: PathBuf,
    hunk: Hunk,
    config: ReviewConfig,
    ct: CancellationToken,
) -> Result<HunkOutcome, CoreError> {
    let minified = stet_diff::minify_hunk(&hunk.raw_body, &hunk.file);

    let definitions = stet_rag::resolve_symbols(
        &*git,
        &repo_root,
        &registry,
        &hunk.file,
        &hunk.raw_body,
        &ResolveOptions {
            max_definitions: config.rag_symbol_max_definitions,
            max_tokens: config.rag_symbol_max_tokens,
        },
        &ct,
    )
    .await;

    let call_graph = stet_rag::resolve_call_graph(
        &*git,
        &repo_root,
        &registry,
        &hunk.file,
        &hunk,
        &CallGraphOptions::default(),
        &ct,
    )
    .await;

    let budget = ContextBudget {
        context_limit: config.context_limit,
        warn_threshold: config.warn_threshold,
        rag_symbol_max_tokens: config.rag_symbol_max_tokens,
        call_graph_max_tokens: config.call_graph_max_tokens,
    };
    let built: BuiltContext = stet_rag::build_context(
        &hunk.file,
        &hunk,
        &minified,
        &definitions,
        call_graph.as_ref(),
        &budget,
    );

    let mut warnings = Vec::new();
    if built.exceeded_warn_threshold {
        warnings.push(format!(
            "context for {} crossed the warn threshold ({} estimated tokens)",
            hunk.file, built.estimated_tokens
        ));
    }

    let prompt = prompts::hunk_prompt(&built);
    let request = GenerateRequest {
        model: config.model.clone(),
        prompt: prompt.clone(),
        system: prompts::system_prompt(&config),
        options: GenerateOptions {
            temperature: config.temperature,
            num_ctx: config.num_ctx,
        },
        stream: true,
    };

    let (findings, raw_response_excerpt, prompt_tokens, completion_tokens, eval_duration_ns) =
        match llm.generate(&request, &ct).await {
            Ok(result) => {
                let strictness = StrictnessPreset::parse(&config.strictness)
                    .unwrap_or(StrictnessPreset::Default)
                    .params();
                let outcome = run_pipeline(&result.text, strictness, config.nitpicky);
                warnings.extend(outcome.warnings);
                let excerpt: String = result.text.chars().take(2000).collect();
                (
                    outcome.findings,
                    excerpt,
                    result.stats.prompt_tokens,
                    result.stats.completion_tokens,
                    result.stats.eval_duration_ns,
                )
            }
            Err(LlmError::Unreachable(reason)) => return Err(CoreError::LlmUnreachable(reason)),
            Err(LlmError::BadRequest(reason)) => return Err(CoreError::LlmBadRequest(reason)),
            Err(other) => {
                log::debug!("model call failed for {}: {other}", hunk.file);
                warnings.push(format!("model call failed for {}: {other}", hunk.file));
                (Vec::new(), String::new(), 0, 0, 0)
            }
        };

    Ok(HunkOutcome {
        file: hunk.file.clone(),
        fingerprint: hunk.fingerprint.clone(),
        findings,
        warnings,
        prompt,
        raw_response_excerpt,
        prompt_tokens,
        completion_tokens,
        eval_duration_ns,
    })
}

impl Orchestrator {
    /// Build an Orchestrator rooted at `repo_root`, owning a state
    /// directory derived from `config` under it.
    #[must_use]
    pub fn new(
        repo_root: PathBuf,
        git: Arc<dyn GitOps>,
        llm: Arc<dyn LlmClient>,
        registry: Arc<SymbolResolverRegistry>,
        sink: Box<dyn EventSink>,
        config: ReviewConfig,
    ) -> Self {
        let state_dir = config.state_dir(&repo_root);
        Self {
            store: SessionStore::new(state_dir.clone()),
            history: HistoryLog::new(state_dir),
            repo_root,
            git,
            llm,
            registry,
            sink,
            config,
        }
    }

    /// Ids to suppress from a fresh batch: the session's own dismissed ids
    /// plus every id dismissed in the last `history_lookback` history
    /// records, so a dismissal survives a `finish`/`start` cycle.
    fn suppressed_ids(&self, session_dismissed: &[String]) -> Result<HashSet<String>, CoreError> {
        let mut ids: HashSet<String> = session_dismissed.iter().cloned().collect();
        let records = self.history.load_all()?;
        let take_from = records.len().saturating_sub(self.config.history_lookback);
        for record in &records[take_from..] {
            for (id, _reason) in &record.dismissed {
                ids.insert(id.clone());
            }
        }
        Ok(ids)
    }

    /// Run the per-hunk pipeline over `hunks` concurrently, bounded by
    /// `config.workers`, emitting progress/finding/warning/done events as
    /// results complete. Completion order is non-deterministic; this is
    /// safe because finding ids are content-addressed.
    async fn review_hunks(
        &mut self,
        hunks: Vec<Hunk>,
        ct: &CancellationToken,
    ) -> Result<ReviewBatch, CoreError> {
        let total = hunks.len();
        let git = Arc::clone(&self.git);
        let llm = Arc::clone(&self.llm);
        let registry = Arc::clone(&self.registry);
        let repo_root = self.repo_root.clone();
        let config = self.config.clone();
        let workers = self.config.workers.max(1);

        let mut stream = futures::stream::iter(hunks.into_iter().map(move |hunk| {
            let git = Arc::clone(&git);
            let llm = Arc::clone(&llm);
            let registry = Arc::clone(&registry);
            let repo_root = repo_root.clone();
            let config = config.clone();
            let ct = ct.clone();
            async move { review_hunk(git, registry, llm, repo_root, hunk, config, ct).await }
        }))
        .buffer_unordered(workers);

        let mut findings = Vec::new();
        let mut fingerprints = Vec::new();
        let mut finding_prompt_context = HashMap::new();
        let mut prompt_shadows = Vec::new();
        let mut prompt_tokens = 0u64;
        let mut completion_tokens = 0u64;
        let mut eval_duration_ns = 0u64;
        let mut completed = 0usize;

        while let Some(outcome) = stream.next().await {
            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(err) => {
                    ct.cancel();
                    return Err(err);
                }
            };
            completed += 1;
            self.sink.progress(completed, total, &outcome.file);
            for warning in &outcome.warnings {
                self.sink.warning(warning);
            }
            for finding in &outcome.findings {
                self.sink.finding(finding);
                finding_prompt_context.insert(finding.id.clone(), outcome.prompt.clone());
            }
            prompt_tokens += outcome.prompt_tokens;
            completion_tokens += outcome.completion_tokens;
            eval_duration_ns += outcome.eval_duration_ns;
            prompt_shadows.push(PromptShadow {
                hunk_fingerprint: outcome.fingerprint.clone(),
                file: outcome.file.clone(),
                prompt: outcome.prompt.clone(),
                raw_response_excerpt: outcome.raw_response_excerpt.clone(),
            });
            fingerprints.push(outcome.fingerprint.clone());
            findings.extend(outcome.findings);
        }

        let stats = RunStats {
            count: findings.len(),
            eval_duration_ns,
            prompt_tokens,
            completion_tokens,
        };
        self.sink.done(&stats);

        Ok(ReviewBatch {
            findings,
            fingerprints,
            finding_prompt_context,
            prompt_shadows,
            stats,
        })
    }

    /// Acquire the lock, verify ancestry, materialize the baseline
    /// worktree, and run every hunk of the diff against it.
    ///
    /// # Errors
    ///
    /// [`CoreError::SessionLocked`] if another process holds the lock,
    /// [`CoreError::DirtyWorktree`] unless `allow_dirty` is set,
    /// [`CoreError::BaselineNotAncestor`]/[`CoreError::BaselineRefUnresolvable`]
    /// on an invalid baseline, [`CoreError::WorktreeExists`] if a session
    /// for this baseline is already in progress, or an LLM transport error.
    pub async fn start(&mut self, reference: &str, ct: &CancellationToken) -> Result<RunStats, CoreError> {
        log::info!("starting review at baseline {reference}");
        let _lock = self.store.acquire_lock()?;

        if !self.config.allow_dirty && self.git.is_dirty(&self.repo_root, ct).await? {
            return Err(CoreError::DirtyWorktree);
        }
        self.llm.ensure_model_present(&self.config.model, ct).await?;

        let resolved = self.git.resolve_ref(&self.repo_root, reference, ct).await?;
        let head = self.git.resolve_ref(&self.repo_root, "HEAD", ct).await?;
        self.git
            .ancestor_of(&self.repo_root, &resolved.sha, &head.sha, ct)
            .await?;

        let worktree_root = self.config.worktree_root(&self.repo_root);
        self.git
            .create_worktree(&self.repo_root, &resolved.sha, &worktree_root, ct)
            .await?;

        let diff_text = self
            .git
            .diff_to_worktree(&self.repo_root, &resolved.sha, ct)
            .await?;
        let mut hunks = stet_diff::parse_hunks(&diff_text);
        sort_hunks(&mut hunks);

        let batch = self.review_hunks(hunks, ct).await?;
        let suppressed = self.suppressed_ids(&[])?;
        let findings = suppress(batch.findings, &suppressed);

        let session = Session {
            baseline_ref: resolved.sha,
            last_reviewed_at: Some(Utc::now()),
            findings,
            dismissed_ids: Vec::new(),
            finding_prompt_context: batch.finding_prompt_context,
            reviewed_fingerprints: batch.fingerprints,
            prompt_shadows: batch.prompt_shadows,
            config: self.config.snapshot(),
        };
        self.store.save(&session)?;
        Ok(batch.stats)
    }

    /// Review only the hunks not yet covered by the session's
    /// reviewed-fingerprint set, merging fresh findings into the existing
    /// set.
    ///
    /// # Errors
    ///
    /// [`CoreError::NoSession`] if no session is in progress, or an LLM
    /// transport error.
    pub async fn run(&mut self, ct: &CancellationToken) -> Result<RunStats, CoreError> {
        let _lock = self.store.acquire_lock()?;
        let mut session = self.store.load()?;
        if !session.exists() {
            return Err(CoreError::NoSession);
        }
        self.llm.ensure_model_present(&self.config.model, ct).await?;

        let diff_text = self
            .git
            .diff_to_worktree(&self.repo_root, &session.baseline_ref, ct)
            .await?;
        let mut all_hunks = stet_diff::parse_hunks(&diff_text);
        sort_hunks(&mut all_hunks);

        let reviewed: HashSet<&str> = session
            .reviewed_fingerprints
            .iter()
            .map(String::as_str)
            .collect();
        let to_review: Vec<Hunk> = all_hunks
            .into_iter()
            .filter(|h| !reviewed.contains(h.fingerprint.as_str()))
            .collect();

        let batch = self.review_hunks(to_review, ct).await?;
        let suppressed = self.suppressed_ids(&session.dismissed_ids)?;
        let fresh = suppress(batch.findings, &suppressed);

        session.findings = merge(session.findings.clone(), fresh, MergeMode::Union, &HashSet::new());
        session.reviewed_fingerprints.extend(batch.fingerprints);
        session.reviewed_fingerprints.sort();
        session.reviewed_fingerprints.dedup();
        session.finding_prompt_context.extend(batch.finding_prompt_context);
        session.prompt_shadows = batch.prompt_shadows;
        session.last_reviewed_at = Some(Utc::now());

        self.store.save(&session)?;
        Ok(batch.stats)
    }

    /// Like [`Orchestrator::run`], but reviews every hunk in the current
    /// diff rather than only the unreviewed ones. Under `config.replace`,
    /// every existing finding is dropped in favor of this run's results
    /// (since this run's scope is the whole diff); otherwise the fresh
    /// batch is unioned in as usual.
    ///
    /// # Errors
    ///
    /// Same as [`Orchestrator::run`].
    pub async fn rerun(&mut self, ct: &CancellationToken) -> Result<RunStats, CoreError> {
        let _lock = self.store.acquire_lock()?;
        let mut session = self.store.load()?;
        if !session.exists() {
            return Err(CoreError::NoSession);
        }
        self.llm.ensure_model_present(&self.config.model, ct).await?;

        let diff_text = self
            .git
            .diff_to_worktree(&self.repo_root, &session.baseline_ref, ct)
            .await?;
        let mut hunks = stet_diff::parse_hunks(&diff_text);
        sort_hunks(&mut hunks);

        let batch = self.review_hunks(hunks, ct).await?;
        let suppressed = self.suppressed_ids(&session.dismissed_ids)?;
        let fresh = suppress(batch.findings, &suppressed);

        let mode = if self.config.replace {
            MergeMode::Replace
        } else {
            MergeMode::Union
        };
        let replaced_ids: HashSet<String> = if self.config.replace {
            session.findings.iter().map(|f| f.id.clone()).collect()
        } else {
            HashSet::new()
        };

        session.findings = merge(session.findings.clone(), fresh, mode, &replaced_ids);
        session.reviewed_fingerprints = batch.fingerprints;
        session.finding_prompt_context = batch.finding_prompt_context;
        session.prompt_shadows = batch.prompt_shadows;
        session.last_reviewed_at = Some(Utc::now());

        self.store.save(&session)?;
        Ok(batch.stats)
    }

    /// Remove the baseline worktree and delete the session document.
    ///
    /// # Errors
    ///
    /// [`CoreError::NoSession`] if no session is in progress.
    pub async fn finish(&mut self, ct: &CancellationToken) -> Result<(), CoreError> {
        let _lock = self.store.acquire_lock()?;
        let session = self.store.load()?;
        if !session.exists() {
            return Err(CoreError::NoSession);
        }

        let worktree_path = self
            .config
            .worktree_root(&self.repo_root)
            .join(format!("stet-{}", session.baseline_ref));
        self.git
            .remove_worktree(&self.repo_root, &worktree_path, ct)
            .await?;
        self.store.delete()?;
        Ok(())
    }

    /// Remove every worktree under the configured worktree root that is
    /// not the current session's baseline, returning the count removed.
    ///
    /// # Errors
    ///
    /// Any `GitOps` failure enumerating or removing a worktree.
    pub async fn cleanup(&self, ct: &CancellationToken) -> Result<usize, CoreError> {
        let session = self.store.load()?;
        let worktree_root = self.config.worktree_root(&self.repo_root);
        let current_path = session
            .exists()
            .then(|| worktree_root.join(format!("stet-{}", session.baseline_ref)));

        let worktrees = self
            .git
            .list_worktrees(&self.repo_root, &worktree_root, current_path.as_deref(), ct)
            .await?;

        let mut removed = 0usize;
        for worktree in worktrees {
            if worktree.is_current {
                continue;
            }
            self.git
                .remove_worktree(&self.repo_root, Path::new(&worktree.path), ct)
                .await?;
            removed += 1;
        }
        Ok(removed)
    }

    /// Resolve `id_or_prefix` to a unique finding id, append it to the
    /// session's dismissed list (idempotently), and append a history
    /// record so the dismissal survives a `finish`/`start` cycle.
    ///
    /// # Errors
    ///
    /// [`CoreError::NoSession`] if no session is in progress, or
    /// [`CoreError::InvalidInput`] if the prefix matches zero or more than
    /// one finding.
    pub fn dismiss(&mut self, id_or_prefix: &str, reason: Option<String>) -> Result<(), CoreError> {
        let _lock = self.store.acquire_lock()?;
        let mut session = self.store.load()?;
        if !session.exists() {
            return Err(CoreError::NoSession);
        }

        let id = session.resolve_id_prefix(id_or_prefix).map_err(|matches| {
            if matches.is_empty() {
                CoreError::InvalidInput(format!("no finding matches id prefix {id_or_prefix:?}"))
            } else {
                CoreError::InvalidInput(format!(
                    "ambiguous id prefix {id_or_prefix:?} matches: {}",
                    matches.join(", ")
                ))
            }
        })?;

        if !session.dismissed_ids.contains(&id) {
            session.dismissed_ids.push(id.clone());
        }

        let record = HistoryRecord {
            timestamp: Utc::now(),
            baseline_ref: session.baseline_ref.clone(),
            dismissed: vec![(id, reason)],
            findings: session.findings.clone(),
            config: session.config.clone(),
        };

        self.store.save(&session)?;
        self.history.append(&record)?;
        Ok(())
    }

    /// A summary view of the current session, empty if none exists.
    ///
    /// # Errors
    ///
    /// Any `SessionStore` read failure.
    pub fn status(&self) -> Result<SessionView, CoreError> {
        Ok(SessionView::from(&self.store.load()?))
    }

    /// Every active (non-dismissed) finding in the current session.
    ///
    /// # Errors
    ///
    /// Any `SessionStore` read failure.
    pub fn list(&self) -> Result<Vec<Finding>, CoreError> {
        Ok(self
            .store
            .load()?
            .active_findings()
            .into_iter()
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_hunks_orders_by_file_then_old_start() {
        let mut hunks = vec![
            Hunk::new("b.rs".to_string(), 5, 1, 5, 1, "@@ -5,1 +5,1 @@\n-x\n+y".to_string()),
            Hunk::new("a.rs".to_string(), 10, 1, 10, 1, "@@ -10,1 +10,1 @@\n-x\n+y".to_string()),
            Hunk::new("a.rs".to_string(), 1, 1, 1, 1, "@@ -1,1 +1,1 @@\n-x\n+y".to_string()),
        ];
        sort_hunks(&mut hunks);
        let order: Vec<(&str, u64)> = hunks.iter().map(|h| (h.file.as_str(), h.old_start)).collect();
        assert_eq!(order, vec![("a.rs", 1), ("a.rs", 10), ("b.rs", 5)]);
    }
}

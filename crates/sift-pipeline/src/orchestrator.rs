//! The pipeline orchestrator: drives one question through every stage.
//!
//! The orchestrator enforces the run order:
//!
//!   Plan → Retrieve → Extract → Analyze → Write → Verify → Critique → Complete
//!
//! Each stage runs under the scheduler with the speed mode's budget. A stage
//! that runs out of time or fails is replaced by its fallback and reported
//! as a `diagnostic` event; the run carries on. Only hard cancellation and
//! fatal configuration stop a run early.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use sift_config::{ModePreset, SiftConfig};
use sift_contracts::{
    credibility::{CredibilityReport, CrossValidationResult},
    error::{SiftError, SiftResult},
    event::{DiagnosticKind, PipelineEvent, StageDiagnostic},
    generation::TokenUsage,
    plan::{Analysis, RouterPlan},
    run::{RunConfig, RunId},
    source::{Fact, Source},
    stage::{StageBudget, StageKind, StagePath},
};
use sift_core::{
    cache::{ResultCache, SharedCache},
    cancel::CancellationToken,
    executor::BoundedExecutor,
    scheduler::{Deadline, StageBudgetScheduler},
    tokens::TokenAccountant,
    traits::{EventSink, SearchProvider, TextClassifier, TextGenerator},
};
use sift_credibility::{CredibilityEvaluator, KeywordClassifier};

use crate::stages::{
    analyze, critique::{self, CritiqueRound}, extract, plan, retrieve, verify, write, StageContext,
};

/// How one stage of a run went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: StageKind,
    pub path: StagePath,
    pub elapsed_ms: u64,
    /// `None` when the run had no deadline or the stage was skipped.
    pub slice_ms: Option<u64>,
}

/// Everything a completed run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub run_id: String,
    pub plan: RouterPlan,
    pub sources: Vec<Source>,
    pub facts: Vec<Fact>,
    pub analysis: Analysis,
    /// The final draft, after any critique rewrites.
    pub draft: String,
    /// `None` when the speed mode skips verification.
    pub verification: Option<CredibilityReport>,
    pub critique_rounds: u32,
    pub tokens: TokenUsage,
    pub stages: Vec<StageRecord>,
}

impl RunOutcome {
    pub fn stage(&self, stage: StageKind) -> Option<&StageRecord> {
        self.stages.iter().find(|r| r.stage == stage)
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ── Stage runner ──────────────────────────────────────────────────────────────

/// Per-run wrapper around the scheduler that turns stage outcomes into
/// records, diagnostics and fallbacks.
struct StageRunner<'a> {
    scheduler: StageBudgetScheduler,
    deadline: Deadline,
    cancel: &'a CancellationToken,
    sink: &'a dyn EventSink,
    records: Vec<StageRecord>,
}

impl StageRunner<'_> {
    fn diagnose(&self, stage: StageKind, kind: DiagnosticKind, detail: String, elapsed: Duration) {
        self.sink.emit(PipelineEvent::Diagnostic(StageDiagnostic {
            stage,
            kind,
            detail,
            elapsed_ms: millis(elapsed),
        }));
    }

    fn skip(&mut self, stage: StageKind) {
        debug!(stage = %stage, "stage skipped");
        self.records.push(StageRecord {
            stage,
            path: StagePath::Skipped,
            elapsed_ms: 0,
            slice_ms: None,
        });
        self.sink.emit(PipelineEvent::StageSkipped { stage });
    }

    /// Run one stage. Non-fatal failures degrade to `fallback`; hard
    /// cancellation is returned as an error.
    async fn run<T, P, Fut, F>(
        &mut self,
        stage: StageKind,
        budget: StageBudget,
        primary: P,
        fallback: F,
    ) -> SiftResult<T>
    where
        P: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = SiftResult<T>>,
        F: Fn() -> T,
    {
        let started = Instant::now();
        let slice_ms = self.deadline_slice(budget);
        let result = self
            .scheduler
            .run(stage, &self.deadline, budget, self.cancel, primary, || fallback())
            .await;

        match result {
            Ok(report) => {
                self.records.push(StageRecord {
                    stage,
                    path: report.path,
                    elapsed_ms: millis(report.elapsed),
                    slice_ms: report.slice.map(millis),
                });
                if report.fell_back() {
                    let slice = report.slice.map(millis).unwrap_or_default();
                    self.diagnose(
                        stage,
                        DiagnosticKind::Timeout,
                        SiftError::StageTimeout {
                            stage: stage.to_string(),
                            slice_ms: slice,
                        }
                        .to_string(),
                        report.elapsed,
                    );
                }
                Ok(report.value)
            }

            Err(err) if err.is_fatal() => {
                self.records.push(StageRecord {
                    stage,
                    path: StagePath::Skipped,
                    elapsed_ms: millis(started.elapsed()),
                    slice_ms,
                });
                self.diagnose(stage, DiagnosticKind::Cancelled, err.to_string(), started.elapsed());
                Err(err)
            }

            Err(err) => {
                warn!(stage = %stage, error = %err, "stage failed, substituting safe default");
                self.records.push(StageRecord {
                    stage,
                    path: StagePath::Degraded,
                    elapsed_ms: millis(started.elapsed()),
                    slice_ms,
                });
                self.diagnose(stage, DiagnosticKind::Failure, err.to_string(), started.elapsed());
                Ok(fallback())
            }
        }
    }

    fn deadline_slice(&self, budget: StageBudget) -> Option<u64> {
        sift_core::scheduler::compute_slice(&self.deadline, budget).map(millis)
    }

    fn remaining(&self) -> Option<Duration> {
        self.deadline.remaining()
    }
}

// ── Orchestrator ──────────────────────────────────────────────────────────────

/// Drives research runs. One instance serves many concurrent runs; they
/// share its executor and caches.
pub struct Orchestrator {
    generator: Arc<dyn TextGenerator>,
    search: Arc<dyn SearchProvider>,
    evaluator: CredibilityEvaluator,
    executor: Arc<BoundedExecutor>,
    search_cache: SharedCache<Vec<Source>>,
    batch_size: usize,
    preset_override: Option<ModePreset>,
}

impl Orchestrator {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        search: Arc<dyn SearchProvider>,
        evaluator: CredibilityEvaluator,
        executor: Arc<BoundedExecutor>,
        search_cache: SharedCache<Vec<Source>>,
    ) -> Self {
        Self {
            generator,
            search,
            evaluator,
            executor,
            search_cache,
            batch_size: sift_config::ExecutorSection::default().batch_size,
            preset_override: None,
        }
    }

    /// Build the executor, both caches and the default classifier from
    /// `config`.
    pub fn from_config(
        config: &SiftConfig,
        generator: Arc<dyn TextGenerator>,
        search: Arc<dyn SearchProvider>,
    ) -> Self {
        let ttl = Duration::from_secs(config.cache.ttl_secs);
        let executor = Arc::new(BoundedExecutor::new(config.executor.concurrency));
        let classifier: Arc<dyn TextClassifier> = Arc::new(KeywordClassifier);
        let verdicts = ResultCache::<CrossValidationResult>::shared(ttl, config.cache.capacity);
        let evaluator = CredibilityEvaluator::new(classifier, verdicts, Arc::clone(&executor));

        Self::new(
            generator,
            search,
            evaluator,
            executor,
            ResultCache::shared(ttl, config.cache.capacity),
        )
        .with_batch_size(config.executor.batch_size)
    }

    /// Use `preset` for every run instead of the speed mode's own.
    pub fn with_preset(mut self, preset: ModePreset) -> Self {
        self.preset_override = Some(preset);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn executor(&self) -> &Arc<BoundedExecutor> {
        &self.executor
    }

    /// Number of cached search responses.
    pub fn cached_searches(&self) -> usize {
        self.search_cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Answer `question` under a fresh run id.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for an empty question and `Cancelled` when `cancel`
    /// fires. Stage failures never surface here.
    pub async fn run(
        &self,
        question: &str,
        config: &RunConfig,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> SiftResult<RunOutcome> {
        self.run_with_id(RunId::new(), question, config, sink, cancel)
            .await
    }

    /// Answer `question` under `run_id`, which lets callers create a trace
    /// recorder for the run before it starts.
    pub async fn run_with_id(
        &self,
        run_id: RunId,
        question: &str,
        config: &RunConfig,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> SiftResult<RunOutcome> {
        let question = question.trim();
        if question.is_empty() {
            return Err(SiftError::InvalidRequest {
                reason: "question must not be empty".to_string(),
            });
        }

        let started = Instant::now();
        let preset = self
            .preset_override
            .unwrap_or_else(|| ModePreset::for_mode(config.speed_mode));
        let tokens = TokenAccountant::new();
        let ctx = StageContext {
            question,
            config,
            preset: &preset,
            generator: &self.generator,
            search: &self.search,
            executor: &self.executor,
            batch_size: self.batch_size,
            search_cache: &self.search_cache,
            evaluator: &self.evaluator,
            tokens: &tokens,
            sink,
        };
        let mut runner = StageRunner {
            scheduler: StageBudgetScheduler::new(),
            deadline: Deadline::from_millis(config.deadline_ms),
            cancel,
            sink,
            records: Vec::new(),
        };

        info!(
            run_id = %run_id,
            mode = config.speed_mode.as_str(),
            deadline_ms = config.deadline_ms,
            use_web = config.use_web,
            "run starting"
        );

        // ── Plan ─────────────────────────────────────────────────────────────
        let plan = runner
            .run(
                StageKind::Plan,
                preset.plan,
                |_token| plan::run(&ctx),
                || plan::heuristic_plan(question, config, &preset),
            )
            .await?;
        sink.emit(PipelineEvent::Plan(plan.clone()));

        // ── Retrieve ─────────────────────────────────────────────────────────
        let sources = if plan.use_web {
            runner
                .run(
                    StageKind::Retrieve,
                    preset.retrieve,
                    |_token| retrieve::run(&ctx, &plan),
                    Vec::new,
                )
                .await?
        } else {
            runner.skip(StageKind::Retrieve);
            Vec::new()
        };
        sink.emit(PipelineEvent::Sources(sources.clone()));

        // ── Extract ──────────────────────────────────────────────────────────
        let facts = runner
            .run(
                StageKind::Extract,
                preset.extract,
                |_token| extract::run(&ctx, &sources),
                extract::fallback,
            )
            .await?;
        sink.emit(PipelineEvent::Facts(facts.clone()));

        // ── Analyze ──────────────────────────────────────────────────────────
        let analysis = runner
            .run(
                StageKind::Analyze,
                preset.analyze,
                |_token| analyze::run(&ctx, &facts),
                || analyze::fallback(&facts),
            )
            .await?;
        sink.emit(PipelineEvent::Analysis(analysis.clone()));

        // ── Write ────────────────────────────────────────────────────────────
        let mut draft = runner
            .run(
                StageKind::Write,
                preset.write,
                |token| {
                    let (ctx, analysis, facts) = (&ctx, &analysis, &facts);
                    async move { write::run(ctx, &token, analysis, facts).await }
                },
                || write::template_draft(question, &analysis, &facts),
            )
            .await?;
        sink.emit(PipelineEvent::Draft {
            text: draft.clone(),
            revision: 0,
        });

        // ── Verify ───────────────────────────────────────────────────────────
        let verification = match preset.verify {
            Some(budget) => {
                let report = runner
                    .run(
                        StageKind::Verify,
                        budget,
                        |_token| verify::run(&ctx, &draft, &sources, &facts),
                        || verify::fallback(&ctx, &sources, &facts),
                    )
                    .await?;
                sink.emit(PipelineEvent::Verification(report.clone()));
                Some(report)
            }
            None => {
                runner.skip(StageKind::Verify);
                None
            }
        };

        // ── Critique ─────────────────────────────────────────────────────────
        let mut critique_rounds = 0u32;
        let mut revision = 0u32;
        match preset.critique {
            Some(budget) => {
                let margin = Duration::from_millis(preset.safety_margin_ms);

                for round in 1..=plan.max_iterations {
                    if runner.remaining().is_some_and(|left| left < margin) {
                        info!(round, "critique stopped, remaining budget below safety margin");
                        break;
                    }

                    let current = draft.clone();
                    let outcome = runner
                        .run(
                            StageKind::Critique,
                            budget,
                            |_token| critique::run(&ctx, round, &current),
                            CritiqueRound::approve,
                        )
                        .await?;
                    critique_rounds = round;

                    sink.emit(PipelineEvent::Critique {
                        round,
                        approved: outcome.approved,
                        issues: outcome.issues.clone(),
                    });
                    if let Some(revised) = outcome.revised {
                        revision += 1;
                        draft = revised;
                        sink.emit(PipelineEvent::Draft {
                            text: draft.clone(),
                            revision,
                        });
                    }
                    if outcome.approved {
                        break;
                    }
                }
            }
            None => runner.skip(StageKind::Critique),
        }

        // ── Complete ─────────────────────────────────────────────────────────
        let usage = tokens.snapshot();
        sink.emit(PipelineEvent::Tokens(usage));

        let elapsed_ms = millis(started.elapsed());
        sink.emit(PipelineEvent::Complete {
            run_id: run_id.to_string(),
            elapsed_ms,
        });

        let degraded = runner
            .records
            .iter()
            .filter(|r| matches!(r.path, StagePath::Fallback | StagePath::Degraded))
            .count();
        info!(
            run_id = %run_id,
            elapsed_ms,
            sources = sources.len(),
            facts = facts.len(),
            critique_rounds,
            degraded_stages = degraded,
            tokens_in = usage.input,
            tokens_out = usage.output,
            "run complete"
        );

        Ok(RunOutcome {
            run_id: run_id.to_string(),
            plan,
            sources,
            facts,
            analysis,
            draft,
            verification,
            critique_rounds,
            tokens: usage,
            stages: runner.records,
        })
    }

    /// Drop every cached search response and verdict.
    pub fn shutdown(&self) {
        if let Ok(mut cache) = self.search_cache.lock() {
            cache.clear();
        }
        self.evaluator.purge_cache();
        info!("orchestrator caches purged");
    }
}

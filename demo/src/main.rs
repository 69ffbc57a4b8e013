//! sift — Research Pipeline Demo CLI
//!
//! Runs the full research pipeline against the offline collaborators and
//! prints every event as it happens. Press Ctrl-C to cancel a run.
//!
//! Usage:
//!   cargo run -p demo -- ask "today's AI hardware news" --mode fast
//!   cargo run -p demo -- ask "Does AI improve healthcare outcomes?" --config config/sift.toml
//!   cargo run -p demo -- check-config --config config/sift.toml

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use sift_config::{ProviderKind, SiftConfig};
use sift_contracts::{
    error::{SiftError, SiftResult},
    event::PipelineEvent,
    run::RunId,
    stage::SpeedMode,
};
use sift_core::{cancel::CancellationToken, traits::EventSink};
use sift_pipeline::{FixtureSearch, OfflineGenerator, Orchestrator, RunOutcome};
use sift_trace::TraceRecorder;

// ── CLI definition ────────────────────────────────────────────────────────────

/// sift — deadline-bounded research pipeline demo.
#[derive(Parser)]
#[command(
    name = "sift-demo",
    about = "sift research pipeline demo",
    long_about = "Runs the sift research pipeline offline, streaming plan, sources,\n\
                  facts, draft, verification and critique events to the terminal."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer one question and print the event stream.
    Ask {
        question: String,
        /// Speed mode: fast, balanced or thorough. Overrides the config file.
        #[arg(long)]
        mode: Option<String>,
        /// TOML configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Overall deadline in milliseconds; 0 disables it.
        #[arg(long)]
        deadline_ms: Option<u64>,
        /// Skip web retrieval.
        #[arg(long)]
        no_web: bool,
        /// Do not ask the generator for extra search queries.
        #[arg(long)]
        no_expansion: bool,
        /// Write the hash-chained event trace to this file as JSON.
        #[arg(long)]
        trace_out: Option<PathBuf>,
        /// Print the run outcome as JSON instead of a summary.
        #[arg(long)]
        json: bool,
    },
    /// Load, override and validate configuration, then print it.
    CheckConfig {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

// ── Console sink ──────────────────────────────────────────────────────────────

/// Prints events as they arrive. Draft deltas stream inline.
struct ConsoleSink;

impl EventSink for ConsoleSink {
    fn emit(&self, event: PipelineEvent) {
        match &event {
            PipelineEvent::DraftDelta { text } => {
                print!("{text}");
                let _ = std::io::stdout().flush();
            }
            PipelineEvent::Plan(plan) => println!(
                "[plan] topic={} stages={} queries={:?}",
                plan.topic.as_str(),
                plan.step_sequence.len(),
                plan.queries
            ),
            PipelineEvent::Sources(sources) => {
                println!("[sources] {}", sources.len());
                for source in sources {
                    println!("  {:.2}  {}", source.score, source.url);
                }
            }
            PipelineEvent::Facts(facts) => println!("[facts] {}", facts.len()),
            PipelineEvent::Analysis(analysis) => println!(
                "[analysis] key_points={} gaps={}\n",
                analysis.key_points.len(),
                analysis.gaps.len()
            ),
            PipelineEvent::Draft { revision, .. } => println!("\n[draft] revision {revision}"),
            PipelineEvent::Verification(report) => println!(
                "[verification] overall={} risk={:?} recommendation={:?}",
                report.score.overall,
                report.uncertainty.risk_level,
                report.uncertainty.recommendation
            ),
            PipelineEvent::Critique { round, approved, issues } => {
                println!("[critique] round {round} approved={approved} issues={issues:?}")
            }
            PipelineEvent::StageSkipped { stage } => println!("[skipped] {stage}"),
            PipelineEvent::Diagnostic(d) => {
                println!("[diagnostic] {} {:?}: {}", d.stage, d.kind, d.detail)
            }
            PipelineEvent::Tokens(usage) => println!(
                "[tokens] in={} out={} calls={}",
                usage.input, usage.output, usage.calls
            ),
            PipelineEvent::Complete { run_id, elapsed_ms } => {
                println!("[complete] run {run_id} in {elapsed_ms}ms")
            }
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Ask {
            question,
            mode,
            config,
            deadline_ms,
            no_web,
            no_expansion,
            trace_out,
            json,
        } => {
            let overrides = RunOverrides {
                mode,
                deadline_ms,
                no_web,
                no_expansion,
            };
            ask(&question, config.as_deref(), overrides, trace_out.as_deref(), json).await
        }
        Command::CheckConfig { config } => check_config(config.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("sift error: {}", e);
        let code = match e {
            SiftError::Cancelled { .. } => 130,
            SiftError::FatalConfig { .. } => 2,
            _ => 1,
        };
        std::process::exit(code);
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

struct RunOverrides {
    mode: Option<String>,
    deadline_ms: Option<u64>,
    no_web: bool,
    no_expansion: bool,
}

fn load_config(path: Option<&Path>, overrides: &RunOverrides) -> SiftResult<SiftConfig> {
    let mut config = SiftConfig::load(path)?;
    if let Some(mode) = &overrides.mode {
        config.run.speed_mode = mode.parse::<SpeedMode>()?;
    }
    if let Some(ms) = overrides.deadline_ms {
        config.run.deadline_ms = ms;
    }
    if overrides.no_web {
        config.run.use_web = false;
    }
    if overrides.no_expansion {
        config.run.query_expansion = false;
    }
    config.validate()?;

    if config.provider.kind == ProviderKind::Remote {
        return Err(SiftError::FatalConfig {
            reason: "the demo only ships offline collaborators; set provider.kind = \"offline\""
                .to_string(),
        });
    }
    Ok(config)
}

async fn ask(
    question: &str,
    config_path: Option<&Path>,
    overrides: RunOverrides,
    trace_out: Option<&Path>,
    json: bool,
) -> SiftResult<()> {
    let config = load_config(config_path, &overrides)?;
    let run_config = config.run_config();

    let orchestrator = Orchestrator::from_config(
        &config,
        Arc::new(OfflineGenerator::new()),
        Arc::new(FixtureSearch::demo()),
    );

    let run_id = RunId::new();
    let recorder = if json {
        TraceRecorder::new(&run_id)
    } else {
        TraceRecorder::new(&run_id).with_forward(Arc::new(ConsoleSink))
    };

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    print_banner(question, &config);
    let result = orchestrator
        .run_with_id(run_id, question, &run_config, &recorder, &cancel)
        .await;

    if let Some(path) = trace_out {
        write_trace(&recorder, path);
    }
    orchestrator.shutdown();

    let outcome = result?;
    if json {
        match serde_json::to_string_pretty(&outcome) {
            Ok(text) => println!("{text}"),
            Err(e) => warn!(error = %e, "could not serialize run outcome"),
        }
    } else {
        print_summary(&outcome, recorder.verify_integrity());
    }
    Ok(())
}

fn write_trace(recorder: &TraceRecorder, path: &Path) {
    let log = recorder.export_log();
    let written = serde_json::to_string_pretty(&log)
        .map_err(|e| e.to_string())
        .and_then(|text| std::fs::write(path, text).map_err(|e| e.to_string()));
    match written {
        Ok(()) => println!("trace: {} events written to {}", log.events.len(), path.display()),
        Err(e) => warn!(path = %path.display(), error = %e, "could not write trace"),
    }
}

fn check_config(path: Option<&Path>) -> SiftResult<()> {
    let overrides = RunOverrides {
        mode: None,
        deadline_ms: None,
        no_web: false,
        no_expansion: false,
    };
    let config = load_config(path, &overrides)?;
    let preset = sift_config::ModePreset::for_mode(config.run.speed_mode);

    println!("configuration OK");
    println!("  speed mode      : {}", config.run.speed_mode.as_str());
    println!("  language        : {}", config.run.language);
    println!("  use web         : {}", config.run.use_web);
    println!("  deadline        : {}", match config.run.deadline_ms {
        0 => "none".to_string(),
        ms => format!("{ms}ms"),
    });
    println!("  query expansion : {}", config.run.query_expansion);
    println!(
        "  retrieval       : top_k={} max_results={} max_per_domain={} min_foreign={}",
        config.retrieval.top_k,
        config.retrieval.max_results,
        config.retrieval.max_per_domain,
        config.retrieval.min_foreign_sources
    );
    println!(
        "  cache           : ttl={}s capacity={}",
        config.cache.ttl_secs, config.cache.capacity
    );
    println!(
        "  executor        : concurrency={} batch_size={}",
        config.executor.concurrency, config.executor.batch_size
    );
    println!(
        "  preset          : verify={} max_iterations={} safety_margin={}ms",
        preset.verifies(),
        preset.max_iterations,
        preset.safety_margin_ms
    );
    Ok(())
}

// ── Output ────────────────────────────────────────────────────────────────────

fn print_banner(question: &str, config: &SiftConfig) {
    println!();
    println!("sift — Research Pipeline");
    println!("========================");
    println!("question : {question}");
    println!(
        "mode     : {}  (web {}, deadline {})",
        config.run.speed_mode.as_str(),
        if config.run.use_web { "on" } else { "off" },
        match config.run.deadline_ms {
            0 => "none".to_string(),
            ms => format!("{ms}ms"),
        }
    );
    println!();
}

fn print_summary(outcome: &RunOutcome, chain_ok: bool) {
    println!();
    println!("Stages:");
    for record in &outcome.stages {
        let slice = record
            .slice_ms
            .map(|ms| format!("{ms}ms"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<9} {:<9} elapsed {:>5}ms  slice {}",
            record.stage.as_str(),
            format!("{:?}", record.path).to_lowercase(),
            record.elapsed_ms,
            slice
        );
    }
    println!();
    println!(
        "sources={} facts={} critique_rounds={} trace_chain={}",
        outcome.sources.len(),
        outcome.facts.len(),
        outcome.critique_rounds,
        if chain_ok { "intact" } else { "BROKEN" }
    );
}

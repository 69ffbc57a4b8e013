//! Structured events emitted at every stage boundary.
//!
//! The transport layer maps each event 1:1 onto a wire message using
//! `name()` and `payload()`. Within one run, events arrive in strict
//! pipeline order.

use serde::{Deserialize, Serialize};

use crate::{
    credibility::CredibilityReport,
    generation::TokenUsage,
    plan::{Analysis, RouterPlan},
    source::{Fact, Source},
    stage::StageKind,
};

/// Why a stage did not produce its primary result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    Timeout,
    Failure,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDiagnostic {
    pub stage: StageKind,
    pub kind: DiagnosticKind,
    pub detail: String,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum PipelineEvent {
    Plan(RouterPlan),
    Sources(Vec<Source>),
    Facts(Vec<Fact>),
    Analysis(Analysis),
    /// One streamed chunk of the draft. Chunks keep their relative order.
    ///
    /// Chunks are provisional. If the Write stage times out or fails
    /// mid-stream, a `diagnostic` follows and the next `draft` event carries
    /// the fallback text; that `draft` replaces whatever chunks were sent.
    DraftDelta { text: String },
    /// A complete draft. `revision` is 0 for the first draft and increases
    /// with every critique rewrite.
    Draft { text: String, revision: u32 },
    Verification(CredibilityReport),
    Critique {
        round: u32,
        approved: bool,
        issues: Vec<String>,
    },
    StageSkipped { stage: StageKind },
    Diagnostic(StageDiagnostic),
    Tokens(TokenUsage),
    Complete { run_id: String, elapsed_ms: u64 },
}

impl PipelineEvent {
    /// Stable wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            PipelineEvent::Plan(_) => "plan",
            PipelineEvent::Sources(_) => "sources",
            PipelineEvent::Facts(_) => "facts",
            PipelineEvent::Analysis(_) => "analysis",
            PipelineEvent::DraftDelta { .. } => "draft_delta",
            PipelineEvent::Draft { .. } => "draft",
            PipelineEvent::Verification(_) => "verification",
            PipelineEvent::Critique { .. } => "critique",
            PipelineEvent::StageSkipped { .. } => "stage_skipped",
            PipelineEvent::Diagnostic(_) => "diagnostic",
            PipelineEvent::Tokens(_) => "tokens",
            PipelineEvent::Complete { .. } => "complete",
        }
    }

    /// The event body as JSON, without the name tag.
    pub fn payload(&self) -> serde_json::Value {
        serde_json::to_value(self)
            .ok()
            .and_then(|mut v| v.get_mut("data").map(serde_json::Value::take))
            .unwrap_or(serde_json::Value::Null)
    }
}

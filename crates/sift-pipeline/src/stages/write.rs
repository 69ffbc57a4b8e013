//! Write: stream the answer draft, emitting every delta as it arrives.

use std::fmt::Write as _;

use futures_util::StreamExt;
use tracing::{debug, info};

use sift_contracts::{
    error::{SiftError, SiftResult},
    event::PipelineEvent,
    generation::GenerationOptions,
    plan::Analysis,
    source::Fact,
    stage::StageKind,
};
use sift_core::{cancel::CancellationToken, traits::{DeltaStream, EventSink}};

use super::StageContext;
use crate::prompts::{writer_user, PromptRole};

/// Draft assembled from the analysis without a generation call.
pub fn template_draft(question: &str, analysis: &Analysis, facts: &[Fact]) -> String {
    let mut draft = format!("## {}\n\n", question.trim());

    if analysis.key_points.is_empty() {
        draft.push_str("No key points could be established from the available evidence.\n");
    } else {
        for point in &analysis.key_points {
            let _ = writeln!(draft, "- {}", point.trim_end_matches('.'));
        }
    }

    if !analysis.gaps.is_empty() {
        draft.push_str("\nOpen questions:\n");
        for gap in &analysis.gaps {
            let _ = writeln!(draft, "- {gap}");
        }
    }

    let mut cited: Vec<&str> = Vec::new();
    for fact in facts.iter().filter(|f| !f.source_ref.is_empty()) {
        if !cited.contains(&fact.source_ref.as_str()) {
            cited.push(&fact.source_ref);
        }
    }
    if !cited.is_empty() {
        let _ = writeln!(draft, "\nSources: {}", cited.join(", "));
    }
    draft
}

/// Drain `stream` into one draft, emitting each non-empty delta in order.
///
/// Returns `Cancelled` as soon as `token` fires; deltas already emitted stay
/// emitted.
pub async fn drain_deltas(
    mut stream: DeltaStream,
    token: &CancellationToken,
    sink: &dyn EventSink,
) -> SiftResult<String> {
    let mut draft = String::new();
    let mut deltas = 0usize;
    loop {
        let next = tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!(deltas, "draft stream cancelled");
                return Err(SiftError::Cancelled {
                    stage: StageKind::Write.as_str().to_string(),
                });
            }
            next = stream.next() => next,
        };
        let Some(delta) = next else { break };
        let delta = delta?;
        if delta.is_empty() {
            continue;
        }
        draft.push_str(&delta);
        deltas += 1;
        sink.emit(PipelineEvent::DraftDelta { text: delta });
    }
    debug!(deltas, "draft stream finished");
    Ok(draft)
}

pub async fn run(
    ctx: &StageContext<'_>,
    token: &CancellationToken,
    analysis: &Analysis,
    facts: &[Fact],
) -> SiftResult<String> {
    let system_prompt = PromptRole::Writer.system_prompt(&ctx.config.language);
    let user_prompt = writer_user(ctx.question, analysis, facts);

    let stream = ctx
        .generator
        .generate_stream(&system_prompt, &user_prompt, &GenerationOptions::prose(2_048))
        .await?;
    let draft = drain_deltas(stream, token, ctx.sink).await?;

    ctx.tokens
        .record_estimated(&format!("{system_prompt}{user_prompt}"), &draft);
    info!(chars = draft.len(), "draft written");
    Ok(draft)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use futures_util::stream;

    use super::*;

    #[derive(Default)]
    struct DeltaLog(Mutex<Vec<String>>);

    impl EventSink for DeltaLog {
        fn emit(&self, event: PipelineEvent) {
            if let PipelineEvent::DraftDelta { text } = event {
                self.0.lock().unwrap().push(text);
            }
        }
    }

    fn deltas(chunks: &[&str]) -> DeltaStream {
        let chunks: Vec<SiftResult<String>> = chunks.iter().map(|c| Ok(c.to_string())).collect();
        stream::iter(chunks).boxed()
    }

    // ── streaming ─────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_drain_emits_non_empty_deltas_in_order() {
        let log = DeltaLog::default();
        let draft = drain_deltas(deltas(&["Chip ", "", "output ", "rose."]), &CancellationToken::new(), &log)
            .await
            .unwrap();

        assert_eq!(draft, "Chip output rose.");
        assert_eq!(*log.0.lock().unwrap(), vec!["Chip ", "output ", "rose."]);
    }

    #[tokio::test]
    async fn test_drain_stops_when_token_fires_mid_stream() {
        let log = DeltaLog::default();
        let stalled = deltas(&["Chip "]).chain(stream::pending()).boxed();
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = tokio::time::timeout(Duration::from_secs(2), drain_deltas(stalled, &token, &log))
            .await
            .expect("drain must observe the token")
            .unwrap_err();

        match err {
            SiftError::Cancelled { stage } => assert_eq!(stage, "write"),
            other => panic!("expected Cancelled, got {other:?}"),
        }
        assert_eq!(*log.0.lock().unwrap(), vec!["Chip "]);
    }

    // ── template ──────────────────────────────────────────────────────────────

    #[test]
    fn test_template_lists_points_and_sources_once() {
        let analysis = Analysis {
            key_points: vec!["Shipments rose.".to_string(), "Memory is scarce".to_string()],
            gaps: vec![],
        };
        let fact = |url: &str| Fact {
            statement: "s".to_string(),
            source_ref: url.to_string(),
            evidence: None,
            published_date: None,
        };
        let draft = template_draft(
            " AI chips ",
            &analysis,
            &[fact("https://a.com"), fact("https://a.com"), fact("https://b.com")],
        );

        assert!(draft.starts_with("## AI chips\n\n- Shipments rose\n- Memory is scarce\n"));
        assert!(draft.ends_with("Sources: https://a.com, https://b.com\n"));
    }

    #[test]
    fn test_template_without_evidence() {
        let draft = template_draft("q", &Analysis::default(), &[Fact::placeholder()]);
        assert!(draft.contains("No key points"));
        assert!(!draft.contains("Sources:"));
    }
}

//! Recording `EventSink` implementation.
//!
//! `TraceRecorder` keeps every event of one run in a `Vec` behind a `Mutex`,
//! chaining each to its predecessor. It can also forward events to another
//! sink, so a caller can both display and record a run.
//!
//! Use `export_log()` after the run completes to obtain a `TraceLog`, and
//! `verify_integrity()` at any time to confirm the chain is intact.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tracing::{debug, warn};

use sift_contracts::{event::PipelineEvent, run::RunId};
use sift_core::traits::EventSink;

use crate::{
    chain::{hash_event, verify_chain},
    event::{TraceEvent, TraceLog},
};

// ── Internal mutable state ────────────────────────────────────────────────────

pub(crate) struct RecorderState {
    /// All events recorded so far, in emit order.
    pub(crate) events: Vec<TraceEvent>,

    pub(crate) sequence: u64,

    /// The `this_hash` of the last event, or `GENESIS_HASH` before any.
    pub(crate) last_hash: String,
}

// ── Public recorder ───────────────────────────────────────────────────────────

/// An append-only, hash-chained transcript of one pipeline run.
pub struct TraceRecorder {
    run_id: String,
    forward: Option<Arc<dyn EventSink>>,
    pub(crate) state: Arc<Mutex<RecorderState>>,
}

impl TraceRecorder {
    pub fn new(run_id: &RunId) -> Self {
        Self {
            run_id: run_id.to_string(),
            forward: None,
            state: Arc::new(Mutex::new(RecorderState {
                events: Vec::new(),
                sequence: 0,
                last_hash: TraceEvent::GENESIS_HASH.to_string(),
            })),
        }
    }

    /// Also pass every event on to `sink` after recording it.
    pub fn with_forward(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.forward = Some(sink);
        self
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// A poisoned lock still holds a consistent chain: every append is a
    /// single push followed by counter updates.
    fn lock(&self) -> MutexGuard<'_, RecorderState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append one event to the chain.
    pub fn record(&self, event: &PipelineEvent) {
        let mut state = self.lock();

        let prev_hash = state.last_hash.clone();
        let sequence = state.sequence;
        let name = event.name().to_string();
        let payload = event.payload();
        let at = Utc::now();

        let this_hash = hash_event(&self.run_id, sequence, &name, &payload, &prev_hash, at);

        state.events.push(TraceEvent {
            sequence,
            run_id: self.run_id.clone(),
            name,
            payload,
            prev_hash,
            this_hash: this_hash.clone(),
            at,
        });
        state.sequence += 1;
        state.last_hash = this_hash;
    }

    pub fn len(&self) -> usize {
        self.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Event names in emit order.
    pub fn names(&self) -> Vec<String> {
        self.lock().events.iter().map(|e| e.name.clone()).collect()
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        self.lock().events.clone()
    }

    /// Concatenated text of every `draft_delta` event, in order.
    pub fn streamed_text(&self) -> String {
        self.lock()
            .events
            .iter()
            .filter(|e| e.name == "draft_delta")
            .filter_map(|e| e.payload.get("text").and_then(|t| t.as_str()))
            .collect()
    }

    /// Export everything recorded so far.
    pub fn export_log(&self) -> TraceLog {
        let state = self.lock();
        let terminal_hash = state
            .events
            .last()
            .map(|e| e.this_hash.clone())
            .unwrap_or_default();

        TraceLog {
            run_id: self.run_id.clone(),
            events: state.events.clone(),
            exported_at: Utc::now(),
            terminal_hash,
        }
    }

    pub fn verify_integrity(&self) -> bool {
        let state = self.lock();
        let valid = verify_chain(&state.events);
        if !valid {
            warn!(run_id = %self.run_id, events = state.events.len(), "trace chain failed verification");
        }
        valid
    }
}

// ── EventSink impl ────────────────────────────────────────────────────────────

impl EventSink for TraceRecorder {
    fn emit(&self, event: PipelineEvent) {
        self.record(&event);
        debug!(run_id = %self.run_id, event = event.name(), "event recorded");
        if let Some(forward) = &self.forward {
            forward.emit(event);
        }
    }
}

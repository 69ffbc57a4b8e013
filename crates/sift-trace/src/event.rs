//! Trace event and log types.
//!
//! `TraceEvent` wraps one emitted `PipelineEvent` with its sequence number
//! and the SHA-256 hashes that make tampering detectable. `TraceLog` is the
//! exported transcript of one run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single entry in the hash chain for one run.
///
/// Modifying any field invalidates `this_hash` and every later `prev_hash`,
/// which `verify_chain` detects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Position in the chain, starting at 0.
    pub sequence: u64,

    pub run_id: String,

    /// Wire name of the pipeline event (`plan`, `draft_delta`, ...).
    pub name: String,

    /// The event body without its name tag.
    pub payload: serde_json::Value,

    /// Hash of the previous event, or `GENESIS_HASH` for the first.
    pub prev_hash: String,

    /// Hash over (run_id, sequence, name, payload, prev_hash, at).
    pub this_hash: String,

    /// When the recorder received the event.
    pub at: DateTime<Utc>,
}

impl TraceEvent {
    /// The `prev_hash` of the first event in every chain.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}

/// The exported transcript of a single run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceLog {
    pub run_id: String,

    /// Every recorded event in chain order.
    pub events: Vec<TraceEvent>,

    pub exported_at: DateTime<Utc>,

    /// The `this_hash` of the last event. Empty if nothing was recorded.
    pub terminal_hash: String,
}

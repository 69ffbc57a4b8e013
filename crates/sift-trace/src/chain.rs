//! Hash-chain primitives: hashing and chain integrity verification.
//!
//! Hash input layout (bytes, in order):
//!   1. run_id as UTF-8 bytes
//!   2. sequence as 8-byte little-endian
//!   3. event name as UTF-8 bytes
//!   4. compact JSON of the payload
//!   5. prev_hash as UTF-8 bytes (64 ASCII hex chars)
//!   6. receive time as RFC 3339 text

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::event::TraceEvent;

/// Compute the SHA-256 hash for one trace event.
///
/// Returns a lowercase 64-character hex string.
pub fn hash_event(
    run_id: &str,
    sequence: u64,
    name: &str,
    payload: &serde_json::Value,
    prev_hash: &str,
    at: DateTime<Utc>,
) -> String {
    // Serializing a `Value` only fails for non-string map keys, which a
    // `Value` cannot hold.
    let payload_json = serde_json::to_vec(payload).unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(run_id.as_bytes());
    hasher.update(sequence.to_le_bytes());
    hasher.update(name.as_bytes());
    hasher.update(&payload_json);
    hasher.update(prev_hash.as_bytes());
    hasher.update(at.to_rfc3339().as_bytes());

    hex::encode(hasher.finalize())
}

/// Verify the integrity of a hash chain.
///
/// Valid when every `prev_hash` links to the preceding event (or
/// `GENESIS_HASH` for the first), every `this_hash` matches its recomputed
/// value, and sequence numbers run 0, 1, 2, ... without gaps. An empty chain
/// is valid.
pub fn verify_chain(events: &[TraceEvent]) -> bool {
    let mut expected_prev = TraceEvent::GENESIS_HASH.to_string();

    for (position, event) in events.iter().enumerate() {
        if event.sequence != position as u64 || event.prev_hash != expected_prev {
            return false;
        }

        let recomputed = hash_event(
            &event.run_id,
            event.sequence,
            &event.name,
            &event.payload,
            &event.prev_hash,
            event.at,
        );
        if event.this_hash != recomputed {
            return false;
        }

        expected_prev = event.this_hash.clone();
    }

    true
}

//! Bounded, TTL-based result cache.
//!
//! Shared by retrieval (search responses) and credibility validation
//! (per-claim verdicts). Entries are valid while their age is at most `ttl`.
//! When capacity is exceeded the oldest *insertion* is evicted; reads do not
//! refresh an entry's position.
//!
//! The cache is not internally synchronized. Callers sharing one instance
//! across tasks wrap it in `Arc<Mutex<_>>` (see [`SharedCache`]).

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

/// One stored payload and the moment it was inserted.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub key: String,
    pub payload: V,
    pub inserted_at: Instant,
}

/// A cache instance shared across concurrent pipeline runs.
pub type SharedCache<V> = Arc<Mutex<ResultCache<V>>>;

/// Deterministic cache key for a query evaluated against a set of URLs.
///
/// The URLs are sorted before hashing, so the key depends on the evidence
/// set and not on retrieval order. Changing the query or any URL changes
/// the key.
pub fn cache_key(query: &str, urls: &[&str]) -> String {
    let mut sorted: Vec<&str> = urls.to_vec();
    sorted.sort_unstable();

    let mut hasher = Sha256::new();
    hasher.update(query.as_bytes());
    for url in sorted {
        hasher.update([0u8]);
        hasher.update(url.as_bytes());
    }
    hex::encode(hasher.finalize())
}

#[derive(Debug)]
pub struct ResultCache<V> {
    ttl: Duration,
    capacity: usize,
    entries: HashMap<String, CacheEntry<V>>,
    /// Keys in insertion order, oldest first.
    order: VecDeque<String>,
}

impl<V: Clone> ResultCache<V> {
    /// Create an empty cache. A `capacity` of zero is treated as one.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Wrap a new cache for sharing between runs.
    pub fn shared(ttl: Duration, capacity: usize) -> SharedCache<V> {
        Arc::new(Mutex::new(Self::new(ttl, capacity)))
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&self, key: &str, now: Instant) -> Option<&V> {
        self.entries
            .get(key)
            .filter(|entry| now.saturating_duration_since(entry.inserted_at) <= self.ttl)
            .map(|entry| &entry.payload)
    }

    pub fn set(&mut self, key: impl Into<String>, payload: V) {
        self.set_at(key, payload, Instant::now());
    }

    /// Insert or replace `key`. A replaced key moves to the back of the
    /// eviction queue, as it counts as a fresh insertion.
    pub fn set_at(&mut self, key: impl Into<String>, payload: V, now: Instant) {
        let key = key.into();
        if self.entries.contains_key(&key) {
            self.order.retain(|k| k != &key);
        }
        self.order.push_back(key.clone());
        self.entries.insert(
            key.clone(),
            CacheEntry {
                key,
                payload,
                inserted_at: now,
            },
        );

        while self.entries.len() > self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    /// Purge every entry older than `ttl`. Returns the number removed.
    pub fn cleanup(&mut self) -> usize {
        self.cleanup_at(Instant::now())
    }

    pub fn cleanup_at(&mut self, now: Instant) -> usize {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.inserted_at) <= ttl);
        let entries = &self.entries;
        self.order.retain(|k| entries.contains_key(k));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

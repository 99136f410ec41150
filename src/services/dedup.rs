//! Duplicate build-event suppression.
//!
//! The CI server re-delivers completion webhooks; identical events inside
//! a rolling TTL window must not trigger another expensive NAS scan.
//! Sizing is bounded by the TTL and the expected event rate, not an
//! explicit max-count.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Rolling-window duplicate detector keyed by event identity.
pub struct DuplicateSuppressor {
    ttl: Duration,
    entries: Mutex<HashMap<String, Instant>>,
}

impl DuplicateSuppressor {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Derived identity of an inbound event.
    fn key(project_name: &str, build_number: i32, event_type: &str, payload: &[u8]) -> String {
        let payload_digest = Sha256::digest(payload);
        let mut hasher = Sha256::new();
        hasher.update(project_name.as_bytes());
        hasher.update([0]);
        hasher.update(build_number.to_be_bytes());
        hasher.update([0]);
        hasher.update(event_type.as_bytes());
        hasher.update([0]);
        hasher.update(payload_digest);
        hex::encode(hasher.finalize())
    }

    /// Returns true when the same event was seen within the TTL window.
    /// Non-duplicates are recorded as a side effect.
    pub fn check_and_record(
        &self,
        project_name: &str,
        build_number: i32,
        event_type: &str,
        payload: &[u8],
    ) -> bool {
        let key = Self::key(project_name, build_number, event_type, payload);
        let now = Instant::now();
        let mut entries = self.entries.lock().expect("suppressor lock poisoned");

        if let Some(seen_at) = entries.get(&key) {
            if now.duration_since(*seen_at) < self.ttl {
                return true;
            }
        }

        entries.insert(key, now);
        false
    }

    /// Evict expired keys; returns how many were removed. Driven by the
    /// background scheduler on a fixed interval.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().expect("suppressor lock poisoned");
        let before = entries.len();
        entries.retain(|_, seen_at| now.duration_since(*seen_at) < self.ttl);
        before - entries.len()
    }

    /// Number of keys currently retained.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("suppressor lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

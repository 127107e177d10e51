//! Readiness Cache (C8, §4.8) - last-known readiness per node, used by the
//! Scheduler Core so candidate selection never blocks on a live agent call.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::{NodeId, ReadinessSnapshot};

struct CacheEntry {
    snapshot: ReadinessSnapshot,
    recorded_at: i64,
}

pub struct ReadinessCache {
    entries: RwLock<HashMap<NodeId, CacheEntry>>,
}

impl ReadinessCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn put(&self, node_id: NodeId, snapshot: ReadinessSnapshot, now_seconds: i64) {
        self.entries.write().unwrap().insert(
            node_id,
            CacheEntry {
                snapshot,
                recorded_at: now_seconds,
            },
        );
    }

    pub fn get(&self, node_id: &str) -> Option<ReadinessSnapshot> {
        self.entries
            .read()
            .unwrap()
            .get(node_id)
            .map(|e| e.snapshot.clone())
    }

    /// Returns the snapshot only if it was recorded within `max_age_seconds`
    /// of `now_seconds`. A node whose readiness went stale (no heartbeat, no
    /// health poll) must not be selected as ready (§4.8).
    pub fn get_fresh(&self, node_id: &str, now_seconds: i64, max_age_seconds: i64) -> Option<ReadinessSnapshot> {
        let entries = self.entries.read().unwrap();
        let entry = entries.get(node_id)?;
        if now_seconds - entry.recorded_at > max_age_seconds {
            None
        } else {
            Some(entry.snapshot.clone())
        }
    }

    pub fn remove(&self, node_id: &str) {
        self.entries.write().unwrap().remove(node_id);
    }
}

impl Default for ReadinessCache {
    fn default() -> Self {
        Self::new()
    }
}
